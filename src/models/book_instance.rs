//! Book instance (lendable copy) model and lending rules

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::book::BookShort;
use crate::error::{AppError, AppResult};

/// Lending status of a copy (stored as SMALLINT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum BookStatus {
    Available = 0,
    Reserved = 1,
    Taken = 2,
    Unavailable = 3,
    Broken = 7,
}

impl BookStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Reserved => "Reserved",
            BookStatus::Taken => "Taken",
            BookStatus::Unavailable => "Unavailable",
            BookStatus::Broken => "Broken",
        }
    }

    /// Statuses in which a copy cannot be assigned to a reader
    pub fn forbids_reader(&self) -> bool {
        matches!(self, BookStatus::Available | BookStatus::Unavailable)
    }
}

impl TryFrom<i16> for BookStatus {
    type Error = String;

    fn try_from(v: i16) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(BookStatus::Available),
            1 => Ok(BookStatus::Reserved),
            2 => Ok(BookStatus::Taken),
            3 => Ok(BookStatus::Unavailable),
            7 => Ok(BookStatus::Broken),
            other => Err(format!("Invalid book instance status: {}", other)),
        }
    }
}

impl From<BookStatus> for i16 {
    fn from(s: BookStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// SQLx conversion for BookStatus
impl sqlx::Type<Postgres> for BookStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BookStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let v: i16 = Decode::<Postgres>::decode(value)?;
        BookStatus::try_from(v).map_err(|e| e.into())
    }
}

impl Encode<'_, Postgres> for BookStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <i16 as Encode<Postgres>>::encode(*self as i16, buf)
    }
}

/// Today's date in the server's local time zone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Due-back date for a loan starting on `from`
pub fn due_date(from: NaiveDate, loan_period_days: i64) -> NaiveDate {
    from + Duration::days(loan_period_days)
}

/// Overdue means a due-back date exists and is strictly before `today`
pub fn is_overdue(due_back: Option<NaiveDate>, today: NaiveDate) -> bool {
    due_back.map(|d| d < today).unwrap_or(false)
}

/// Presentation flag for the take/extend transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LendingAction {
    Taking,
    Extending,
}

/// Full book instance row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: i32,
    pub due_back: Option<NaiveDate>,
    pub reader_id: Option<i32>,
    pub status: BookStatus,
}

impl BookInstance {
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        is_overdue(self.due_back, today)
    }

    /// Only the assigned reader may change or return a copy
    pub fn ensure_reader(&self, user_id: i32) -> AppResult<()> {
        if self.reader_id == Some(user_id) {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "You can only manage book instances assigned to you".to_string(),
            ))
        }
    }

    /// Decide the take/extend transition for `user_id`.
    ///
    /// Both branches end with status Taken and a fresh due-back date; the
    /// returned action only tells the caller which one happened.
    pub fn plan_take(&self, user_id: i32) -> AppResult<LendingAction> {
        self.ensure_reader(user_id)?;
        match self.status {
            BookStatus::Reserved => Ok(LendingAction::Taking),
            BookStatus::Taken => Ok(LendingAction::Extending),
            other => Err(AppError::BusinessRule(format!(
                "Book instance is {} and cannot be taken",
                other.label().to_lowercase()
            ))),
        }
    }
}

/// Internal row structure for instance queries joined with book and reader
#[derive(Debug, Clone, FromRow)]
pub struct BookInstanceRow {
    id: Uuid,
    book_id: i32,
    book_title: String,
    due_back: Option<NaiveDate>,
    reader_id: Option<i32>,
    reader_username: Option<String>,
    status: BookStatus,
}

impl BookInstanceRow {
    pub fn into_details(self, today: NaiveDate) -> BookInstanceDetails {
        BookInstanceDetails {
            is_overdue: is_overdue(self.due_back, today),
            display: format!("{} - {}", self.book_title, self.status.label()),
            id: self.id,
            book: BookShort {
                id: self.book_id,
                title: self.book_title,
            },
            due_back: self.due_back,
            reader_id: self.reader_id,
            reader_username: self.reader_username,
            status: self.status,
        }
    }
}

/// Book instance with book and reader for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookInstanceDetails {
    pub id: Uuid,
    pub book: BookShort,
    pub due_back: Option<NaiveDate>,
    pub reader_id: Option<i32>,
    pub reader_username: Option<String>,
    pub status: BookStatus,
    pub is_overdue: bool,
    /// "{title} - {status}"
    pub display: String,
}

/// Result of a take/extend request
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LendingUpdate {
    pub action: LendingAction,
    pub instance: BookInstanceDetails,
}

/// Admin instance listing filter
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookInstanceFilter {
    /// Instance identifier prefix or book title fragment
    pub query: Option<String>,
    pub status: Option<BookStatus>,
    /// Exact due-back date (YYYY-MM-DD)
    pub due_back: Option<NaiveDate>,
    pub page: Option<String>,
}

/// Admin: add a copy of a book
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookInstance {
    pub book_id: i32,
    pub status: Option<BookStatus>,
    pub due_back: Option<NaiveDate>,
    pub reader_id: Option<i32>,
}

/// Admin: edit status, due-back and reader from the list view.
///
/// Absent fields are left alone; `null` clears `due_back` / `reader_id`.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PatchBookInstance {
    pub status: Option<BookStatus>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub due_back: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub reader_id: Option<Option<i32>>,
}

impl PatchBookInstance {
    /// Apply the patch to `current`, keeping readers off idle copies.
    ///
    /// An explicit reader on an Available/Unavailable copy is rejected; an
    /// inherited one is dropped.
    pub fn apply(&self, current: &BookInstance) -> AppResult<BookInstance> {
        let status = self.status.unwrap_or(current.status);
        let due_back = self.due_back.unwrap_or(current.due_back);

        let reader_id = if status.forbids_reader() {
            if let Some(Some(_)) = self.reader_id {
                return Err(AppError::field(
                    "reader_id",
                    format!("A {} book instance cannot have a reader", status.label().to_lowercase()),
                ));
            }
            None
        } else {
            self.reader_id.unwrap_or(current.reader_id)
        };

        Ok(BookInstance {
            id: current.id,
            book_id: current.book_id,
            due_back,
            reader_id,
            status,
        })
    }
}

impl CreateBookInstance {
    pub fn status(&self) -> BookStatus {
        self.status.unwrap_or(BookStatus::Available)
    }

    pub fn check(&self) -> AppResult<()> {
        if self.status().forbids_reader() && self.reader_id.is_some() {
            return Err(AppError::field(
                "reader_id",
                format!(
                    "A {} book instance cannot have a reader",
                    self.status().label().to_lowercase()
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instance(status: BookStatus, reader_id: Option<i32>) -> BookInstance {
        BookInstance {
            id: Uuid::new_v4(),
            book_id: 1,
            due_back: Some(date(2024, 3, 15)),
            reader_id,
            status,
        }
    }

    #[test]
    fn test_status_codes() {
        for status in [
            BookStatus::Available,
            BookStatus::Reserved,
            BookStatus::Taken,
            BookStatus::Unavailable,
            BookStatus::Broken,
        ] {
            assert_eq!(BookStatus::try_from(i16::from(status)), Ok(status));
        }
        assert_eq!(i16::from(BookStatus::Broken), 7);
        assert!(BookStatus::try_from(4i16).is_err());
        assert_eq!(BookStatus::Taken.to_string(), "Taken");
    }

    #[test]
    fn test_status_json() {
        assert_eq!(serde_json::to_string(&BookStatus::Reserved).unwrap(), "\"reserved\"");
        let parsed: BookStatus = serde_json::from_str("\"broken\"").unwrap();
        assert_eq!(parsed, BookStatus::Broken);
    }

    #[test]
    fn test_is_overdue() {
        let today = date(2024, 3, 15);
        assert!(!is_overdue(None, today));
        assert!(!is_overdue(Some(today), today));
        assert!(!is_overdue(Some(date(2024, 3, 16)), today));
        assert!(is_overdue(Some(date(2024, 3, 14)), today));
        assert!(instance(BookStatus::Taken, Some(1)).is_overdue_on(date(2024, 4, 1)));
    }

    #[test]
    fn test_due_date() {
        assert_eq!(due_date(date(2024, 2, 20), 14), date(2024, 3, 5));
    }

    #[test]
    fn test_only_reader_may_manage() {
        let copy = instance(BookStatus::Reserved, Some(10));
        assert!(copy.ensure_reader(10).is_ok());
        assert!(matches!(copy.ensure_reader(11), Err(AppError::Authorization(_))));
        assert!(matches!(
            instance(BookStatus::Available, None).ensure_reader(10),
            Err(AppError::Authorization(_))
        ));
    }

    #[test]
    fn test_plan_take() {
        assert_eq!(
            instance(BookStatus::Reserved, Some(3)).plan_take(3).unwrap(),
            LendingAction::Taking
        );
        assert_eq!(
            instance(BookStatus::Taken, Some(3)).plan_take(3).unwrap(),
            LendingAction::Extending
        );
        assert!(matches!(
            instance(BookStatus::Broken, Some(3)).plan_take(3),
            Err(AppError::BusinessRule(_))
        ));
        assert!(matches!(
            instance(BookStatus::Reserved, Some(3)).plan_take(4),
            Err(AppError::Authorization(_))
        ));
    }

    #[test]
    fn test_patch_clears_reader_on_idle_status() {
        let current = instance(BookStatus::Taken, Some(5));
        let patch = PatchBookInstance {
            status: Some(BookStatus::Available),
            due_back: Some(None),
            reader_id: None,
        };
        let updated = patch.apply(&current).unwrap();
        assert_eq!(updated.status, BookStatus::Available);
        assert_eq!(updated.reader_id, None);
        assert_eq!(updated.due_back, None);
    }

    #[test]
    fn test_patch_rejects_reader_on_idle_status() {
        let current = instance(BookStatus::Available, None);
        let patch = PatchBookInstance {
            status: None,
            due_back: None,
            reader_id: Some(Some(9)),
        };
        assert!(matches!(patch.apply(&current), Err(AppError::InvalidForm(_))));
    }

    #[test]
    fn test_patch_keeps_absent_fields() {
        let current = instance(BookStatus::Reserved, Some(5));
        let patch: PatchBookInstance = serde_json::from_str(r#"{"status": "taken"}"#).unwrap();
        let updated = patch.apply(&current).unwrap();
        assert_eq!(updated.status, BookStatus::Taken);
        assert_eq!(updated.reader_id, Some(5));
        assert_eq!(updated.due_back, current.due_back);

        let patch: PatchBookInstance = serde_json::from_str(r#"{"reader_id": null}"#).unwrap();
        assert_eq!(patch.apply(&current).unwrap().reader_id, None);
    }

    #[test]
    fn test_create_instance_check() {
        let create = CreateBookInstance {
            book_id: 1,
            status: None,
            due_back: None,
            reader_id: Some(2),
        };
        assert!(create.check().is_err());

        let create = CreateBookInstance {
            book_id: 1,
            status: Some(BookStatus::Reserved),
            due_back: None,
            reader_id: Some(2),
        };
        assert!(create.check().is_ok());
    }
}
