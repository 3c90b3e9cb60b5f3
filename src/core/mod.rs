//! Request pipeline, data models and explorer session.

pub mod client;
pub mod http;
pub mod logging;
pub mod models;
pub mod session;
pub mod url;

pub use client::{PreparedRequest, ServiceClient};
pub use http::RequestOptions;
pub use models::{
    FeatureCollection, FieldDescriptor, LayerDetail, LayerSummary, QueryOptions, RobotOutput,
    ServiceDescriptor,
};
pub use session::{Command, Effect, Response, Session, Status, StatusLevel};
