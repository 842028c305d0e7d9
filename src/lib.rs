pub mod cli;
pub mod controller;
pub mod detail;
pub mod error;
pub mod labels;
pub mod media;
pub mod pages;
pub mod route;
pub mod settings;
pub mod tmdb;

#[cfg(test)]
mod testing;

pub use controller::{Applied, EndpointSource, PageSource, PageState, PagedController, ViewStatus};
pub use detail::{DetailController, DetailView, MediaDetail};
pub use error::{ApiError, AppError, ControllerError, RouteError, SettingsError};
pub use media::{MediaFilter, MediaId, MediaSummary, MediaType, Paginated};
pub use route::Route;
pub use settings::AppSettings;
pub use tmdb::{Endpoint, TmdbClient, Transport};
