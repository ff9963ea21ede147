use crate::{
    api::{attendance, dashboard, members, memberships, payments, reminders, revenue},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-route rate limiters, built once and shared by every worker.
#[derive(Clone)]
pub struct Limiters {
    login: Limiter,
    protected: Limiter,
}

impl Limiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: build_limiter(config.rate_login_per_min)?,
            protected: build_limiter(config.rate_protected_per_min)?,
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / u64::from(requests_per_min)).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {} requests per minute", requests_per_min))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiters: &Limiters) {
    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(limiters.login.clone())
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(limiters.protected.clone())
            .service(
                web::scope("/members")
                    // /members
                    .service(
                        web::resource("")
                            .route(web::post().to(members::create_member))
                            .route(web::get().to(members::list_members)),
                    )
                    // fixed paths before /members/{id}
                    .service(web::resource("/search").route(web::get().to(members::quick_search)))
                    .service(web::resource("/active").route(web::get().to(members::active_members)))
                    .service(
                        web::resource("/expired").route(web::get().to(members::expired_members)),
                    )
                    // /members/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(members::get_member))
                            .route(web::put().to(members::update_member)),
                    )
                    .service(
                        web::resource("/{id}/memberships")
                            .route(web::post().to(memberships::renew_membership)),
                    )
                    .service(
                        web::resource("/{id}/payments")
                            .route(web::get().to(payments::member_payments)),
                    )
                    .service(
                        web::resource("/{id}/attendance")
                            .route(web::get().to(attendance::member_attendance)),
                    ),
            )
            .service(
                web::resource("/attendance")
                    .route(web::post().to(attendance::check_in))
                    .route(web::get().to(attendance::list_attendance)),
            )
            .service(web::resource("/dashboard").route(web::get().to(dashboard::dashboard)))
            .service(web::resource("/revenue").route(web::get().to(revenue::revenue_report)))
            .service(
                web::resource("/reminders/expired")
                    .route(web::get().to(reminders::expired_reminders)),
            ),
    );
}
