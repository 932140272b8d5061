use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[derive(EnumString, AsRefStr, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Hr,
    Employee,
}

impl Role {
    /// Regular staff get daily attendance rows; administrative roles do not.
    pub fn is_regular_staff(&self) -> bool {
        matches!(self, Role::Employee)
    }
}
