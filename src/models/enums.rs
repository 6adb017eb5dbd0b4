//! Shared domain enums

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Account role. Serialized with the names the browser client expects,
/// stored as `head` / `staff` / `member`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Role {
    #[serde(rename = "kepala_perpustakaan")]
    Head,
    #[serde(rename = "staff")]
    Staff,
    #[serde(rename = "anggota")]
    Member,
}

impl Role {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Head => "head",
            Role::Staff => "staff",
            Role::Member => "member",
        }
    }

    /// Name used on the JSON wire
    pub fn wire_name(&self) -> &'static str {
        match self {
            Role::Head => "kepala_perpustakaan",
            Role::Staff => "staff",
            Role::Member => "anggota",
        }
    }

    /// Head librarian or staff
    pub fn is_staff(&self) -> bool {
        match self {
            Role::Head | Role::Staff => true,
            Role::Member => false,
        }
    }

    pub fn is_head(&self) -> bool {
        match self {
            Role::Head => true,
            Role::Staff | Role::Member => false,
        }
    }

    fn from_storage(s: &str) -> Result<Self, String> {
        match s {
            "head" => Ok(Role::Head),
            "staff" => Ok(Role::Staff),
            "member" => Ok(Role::Member),
            other => Err(format!("Invalid stored role: {}", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    /// Parses the wire names sent by clients
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "kepala_perpustakaan" => Ok(Role::Head),
            "staff" => Ok(Role::Staff),
            "anggota" => Ok(Role::Member),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<Postgres>>::decode(value)?;
        Role::from_storage(s).map_err(|e| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

// ---------------------------------------------------------------------------
// LoanStatus
// ---------------------------------------------------------------------------

/// Loan status. Wire names `dipinjam` / `dikembalikan`, stored as
/// `active` / `returned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    #[serde(rename = "dipinjam")]
    Active,
    #[serde(rename = "dikembalikan")]
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Returned => "returned",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LoanStatus::Active),
            "returned" => Ok(LoanStatus::Returned),
            other => Err(format!("Invalid loan status: {}", other)),
        }
    }
}

impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<Postgres>>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}
