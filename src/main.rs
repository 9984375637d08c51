use rocket::launch;

#[launch]
fn rocket() -> _ {
    quotes_api::rocket()
}
