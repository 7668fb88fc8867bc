#[rocket::launch]
fn rocket() -> _ {
    let rocket = wayfarer_api::rocket();
    log::info!("Starting Wayfarer API Server");
    rocket
}
