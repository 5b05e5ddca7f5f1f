mod domain;
mod infrastructure;
mod interfaces;
pub mod background_task;
pub mod constants;
pub mod errors;
pub mod graceful_shutdown;
pub mod settings;

pub use domain::{entities, use_cases};
pub use infrastructure::{email, limiter, utils};
pub use interfaces::{handlers, routes};

use email::resend::{Mailer, ResendMailer};
use limiter::rate_limiter::RateLimiterStore;
use settings::AppConfig;
use use_cases::contact::ContactGateway;

pub struct AppState<M>
where
    M: Mailer,
{
    pub contact_gateway: ContactGateway<M>,
}

pub type AppContactGateway = ContactGateway<ResendMailer>;

impl AppState<ResendMailer> {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let mailer = ResendMailer::new(config)?;
        Ok(AppState::with_mailer(config, mailer))
    }
}

impl<M> AppState<M>
where
    M: Mailer,
{
    /// Builds the state around an arbitrary mailer; tests inject a mock here.
    pub fn with_mailer(config: &AppConfig, mailer: M) -> Self {
        let limiter = RateLimiterStore::new();
        AppState {
            contact_gateway: ContactGateway::new(mailer, limiter, config.clone()),
        }
    }
}
