//! Request bodies for the REST endpoints.
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct JoinRequest<'a> {
    pub player_name: &'a str,
}
