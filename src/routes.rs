use crate::{
    api::{alert, backup, chantier, entry, leave, planning, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .milliseconds_per_request(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter.clone())
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/users")
                    .service(
                        web::resource("")
                            .route(web::get().to(user::list_users))
                            .route(web::post().to(user::create_user)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(user::update_user))
                            .route(web::delete().to(user::delete_user)),
                    ),
            )
            .service(
                web::scope("/chantiers")
                    .service(
                        web::resource("")
                            .route(web::get().to(chantier::list_chantiers))
                            .route(web::post().to(chantier::create_chantier)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(chantier::get_chantier))
                            .route(web::put().to(chantier::update_chantier)),
                    )
                    .service(
                        web::resource("/{id}/members")
                            .route(web::post().to(chantier::add_member))
                            .route(web::delete().to(chantier::remove_member)),
                    )
                    .service(
                        web::resource("/{id}/entries")
                            .route(web::get().to(chantier::chantier_entries)),
                    )
                    .service(
                        web::resource("/{id}/alerts")
                            .route(web::get().to(alert::list_alerts))
                            .route(web::post().to(alert::create_alert)),
                    ),
            )
            .service(
                web::scope("/entries")
                    .service(web::resource("").route(web::post().to(entry::create_entry)))
                    .service(
                        web::resource("/pending").route(web::get().to(entry::pending_entries)),
                    )
                    .service(
                        web::resource("/{id}/validate")
                            .route(web::put().to(entry::validate_entry)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(entry::update_entry))
                            .route(web::delete().to(entry::delete_entry)),
                    ),
            )
            .service(
                web::scope("/leaves")
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::list_leaves))
                            .route(web::post().to(leave::create_leave)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(leave::get_leave)))
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(leave::decide_leave)),
                    ),
            )
            .service(
                web::scope("/planning").service(
                    web::resource("/{year}/{month}")
                        .route(web::get().to(planning::calendar_month)),
                ),
            )
            .service(
                web::scope("/alerts").service(
                    web::resource("/{id}")
                        .route(web::put().to(alert::update_alert))
                        .route(web::delete().to(alert::delete_alert)),
                ),
            )
            .service(web::resource("/backup").route(web::post().to(backup::create_backup))),
    );
}
