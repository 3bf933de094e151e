//! User roles.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Role assigned to a user at provisioning time.
///
/// `admin` is a display-only role derived elsewhere and is never part of
/// the provisioning write path, so it is deliberately absent here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A blood donor. Requires a blood group.
    #[default]
    Donor,
    /// Clinic or drive staff. Never carries a blood group.
    Staff,
}

impl Role {
    /// The role as its wire/database string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Donor => "donor",
            Self::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "donor" => Ok(Self::Donor),
            "staff" => Ok(Self::Staff),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

/// Error returned when parsing a role string that is not `donor` or `staff`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown role: {0:?} (expected \"donor\" or \"staff\")")]
pub struct UnknownRole(pub String);

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Role {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("donor".parse::<Role>().unwrap(), Role::Donor);
        assert_eq!("staff".parse::<Role>().unwrap(), Role::Staff);
        assert!("admin".parse::<Role>().is_err());
        assert!("Donor".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Donor).unwrap(), "\"donor\"");
        let role: Role = serde_json::from_str("\"staff\"").unwrap();
        assert_eq!(role, Role::Staff);
    }

    #[test]
    fn test_default_is_donor() {
        // Webhook events without an explicit role default to donor
        assert_eq!(Role::default(), Role::Donor);
    }
}
