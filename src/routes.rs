use crate::{
    api::{attendance, dashboard, document, leave, payroll, performance, project, review, statistics, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter allowing `requests_per_min` with a burst of the same size.
fn build_limiter(requests_per_min: u32) -> Limiter {
    let requests_per_min = requests_per_min.max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond((60_000 / requests_per_min as u64).max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_default();
    Governor::new(&cfg)
}

/// Built once and cloned into every worker so the quotas are shared.
#[derive(Clone)]
pub struct Limiters {
    login: Arc<Limiter>,
    refresh: Arc<Limiter>,
    protected: Arc<Limiter>,
}

impl Limiters {
    pub fn new(config: &Config) -> Self {
        Self {
            login: Arc::new(build_limiter(config.rate_login_per_min)),
            refresh: Arc::new(build_limiter(config.rate_refresh_per_min)),
            protected: Arc::new(build_limiter(config.rate_protected_per_min)),
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &Limiters) {
    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(limiters.refresh.clone())
                    .route(web::post().to(handlers::refresh_token)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiters.protected.clone()) // rate limiting
            .service(web::resource("/me").route(web::get().to(handlers::me)))
            .service(
                web::scope("/users")
                    .service(
                        web::resource("")
                            .route(web::post().to(user::create_user))
                            .route(web::get().to(user::list_users)),
                    )
                    .service(web::resource("/search").route(web::get().to(user::search_users)))
                    .service(web::resource("/exists").route(web::get().to(user::exists)))
                    .service(web::resource("/count").route(web::get().to(user::count_users)))
                    .service(web::resource("/team").route(web::get().to(user::team)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(user::get_user))
                            .route(web::put().to(user::update_user))
                            .route(web::delete().to(user::delete_user)),
                    )
                    .service(web::resource("/{id}/status").route(web::put().to(user::update_status)))
                    .service(web::resource("/{id}/password").route(web::put().to(user::change_password))),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                    .service(web::resource("/punch-in").route(web::post().to(attendance::punch_in)))
                    .service(web::resource("/punch-out").route(web::post().to(attendance::punch_out)))
                    .service(web::resource("/today").route(web::get().to(attendance::today)))
                    .service(web::resource("/hours").route(web::get().to(attendance::working_hours)))
                    .service(web::resource("/absent").route(web::post().to(attendance::mark_absent)))
                    .service(web::resource("/half-day").route(web::post().to(attendance::mark_half_day)))
                    .service(web::resource("/on-leave").route(web::post().to(attendance::mark_on_leave)))
                    .service(web::resource("/date/{date}").route(web::get().to(attendance::by_date)))
                    .service(
                        web::resource("/department/{department}/{date}")
                            .route(web::get().to(attendance::by_department)),
                    )
                    .service(web::resource("/status/{status}").route(web::get().to(attendance::by_status)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(attendance::get_attendance))
                            .route(web::delete().to(attendance::delete_attendance)),
                    ),
            )
            .service(
                web::scope("/leave")
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::list_leaves))
                            .route(web::post().to(leave::apply_leave)),
                    )
                    .service(web::resource("/pending").route(web::get().to(leave::pending_leaves)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave::get_leave))
                            .route(web::delete().to(leave::delete_leave)),
                    )
                    .service(web::resource("/{id}/approve").route(web::put().to(leave::approve_leave)))
                    .service(web::resource("/{id}/reject").route(web::put().to(leave::reject_leave)))
                    .service(web::resource("/{id}/cancel").route(web::put().to(leave::cancel_leave))),
            )
            .service(
                web::scope("/payroll")
                    .service(
                        web::resource("")
                            .route(web::post().to(payroll::create_payroll))
                            .route(web::get().to(payroll::list_payrolls)),
                    )
                    .service(web::resource("/generate").route(web::post().to(payroll::generate_payroll)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(payroll::get_payroll))
                            .route(web::put().to(payroll::update_payroll))
                            .route(web::delete().to(payroll::delete_payroll)),
                    )
                    .service(web::resource("/{id}/process").route(web::put().to(payroll::process_payroll)))
                    .service(web::resource("/{id}/pay").route(web::put().to(payroll::pay_payroll))),
            )
            .service(
                web::scope("/performance")
                    .service(
                        web::resource("")
                            .route(web::post().to(performance::submit_performance))
                            .route(web::get().to(performance::list_performances)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(performance::get_performance))
                            .route(web::put().to(performance::update_performance))
                            .route(web::delete().to(performance::delete_performance)),
                    )
                    .service(
                        web::resource("/{id}/review").route(web::put().to(performance::review_performance)),
                    )
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(performance::approve_performance)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(performance::reject_performance)),
                    ),
            )
            .service(
                web::scope("/documents")
                    .service(
                        web::resource("")
                            .route(web::post().to(document::create_document))
                            .route(web::get().to(document::list_documents)),
                    )
                    .service(web::resource("/search").route(web::get().to(document::search_documents)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(document::get_document))
                            .route(web::put().to(document::update_document))
                            .route(web::delete().to(document::delete_document)),
                    ),
            )
            .service(
                web::scope("/projects")
                    .service(
                        web::resource("")
                            .route(web::post().to(project::create_project))
                            .route(web::get().to(project::list_projects)),
                    )
                    .service(web::resource("/search").route(web::get().to(project::search_projects)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(project::get_project))
                            .route(web::put().to(project::update_project))
                            .route(web::delete().to(project::delete_project)),
                    ),
            )
            .service(
                web::scope("/reviews")
                    .service(
                        web::resource("")
                            .route(web::post().to(review::create_review))
                            .route(web::get().to(review::list_reviews)),
                    )
                    .service(web::resource("/search").route(web::get().to(review::search_reviews)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(review::get_review))
                            .route(web::put().to(review::update_review))
                            .route(web::delete().to(review::delete_review)),
                    ),
            )
            .service(
                web::scope("/statistics")
                    .service(web::resource("/attendance").route(web::get().to(statistics::attendance)))
                    .service(
                        web::resource("/attendance/department/{department}")
                            .route(web::get().to(statistics::department_attendance)),
                    )
                    .service(
                        web::resource("/attendance/user/{id}").route(web::get().to(statistics::user_attendance)),
                    )
                    .service(web::resource("/leave").route(web::get().to(statistics::leave)))
                    .service(web::resource("/payroll").route(web::get().to(statistics::payroll)))
                    .service(web::resource("/performance").route(web::get().to(statistics::performance))),
            )
            .service(
                web::scope("/dashboard")
                    .service(web::resource("").route(web::get().to(dashboard::organisation)))
                    .service(web::resource("/me").route(web::get().to(dashboard::mine)))
                    .service(web::resource("/user/{id}").route(web::get().to(dashboard::employee))),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns a new token pair
