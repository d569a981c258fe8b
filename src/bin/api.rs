#[macro_use]
extern crate rocket;

use std::sync::Arc;

use sentinelcheck::config::Config;
use sentinelcheck::db::Db;
use sentinelcheck::rate_limiter::RateLimiter;
use sentinelcheck::{catchers, routes};

#[launch]
fn rocket() -> _ {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().expect("invalid configuration");
    let database = Arc::new(Db::new(&config.database_path).expect("failed to initialize database"));
    let rate_limiter = RateLimiter::new(config.monitor_rate_limit, 3600);

    let cors = rocket_cors::CorsOptions::default()
        .to_cors()
        .expect("failed to build CORS fairing");

    rocket::build()
        .manage(database)
        .manage(config)
        .manage(rate_limiter)
        .attach(cors)
        .register("/", catchers![
            catchers::bad_request,
            catchers::unauthorized,
            catchers::forbidden,
            catchers::not_found,
            catchers::unprocessable_entity,
            catchers::too_many_requests,
            catchers::internal_error,
        ])
        .mount(
            "/api/v1",
            routes![
                routes::register,
                routes::login,
                routes::me,
                routes::create_monitor,
                routes::list_monitors,
                routes::get_monitor,
                routes::update_monitor,
                routes::delete_monitor,
                routes::get_monitor_checks,
                routes::get_monitor_ssl_status,
                routes::create_alert_rule,
                routes::list_alert_rules,
                routes::get_alert_rule,
                routes::update_alert_rule,
                routes::delete_alert_rule,
                routes::create_alert_channel,
                routes::list_alert_channels,
                routes::get_alert_channel,
                routes::delete_alert_channel,
                routes::list_incidents,
                routes::dashboard,
                routes::health,
            ],
        )
        .mount("/", routes![routes::status_page])
}
