//! Ledger and account tests against a real PostgreSQL database.
//!
//! Each test gets a fresh migrated database from `#[sqlx::test]`.
//! Run with: DATABASE_URL=postgres://... cargo test --test loan_ledger -- --ignored

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use async_trait::async_trait;

use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;

use smart_library_server::{
    error::{AppError, AppResult},
    models::{
        book::{BookFields, BookFilter, Pagination, StockFilter},
        loan::Checkout,
        user::{CreateUser, Identity, NewUser},
        Role,
    },
    repository::Repository,
    services::{
        auth::hash_password,
        sessions::{MemorySessionStore, SessionManager, SessionStore},
        Services,
    },
};

fn services(pool: &PgPool) -> Services {
    let sessions = SessionManager::new(Arc::new(MemorySessionStore::new()), 60);
    Services::new(Repository::new(pool.clone()), sessions)
}

fn days_from_today(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

async fn add_user(repo: &Repository, username: &str, role: Role) -> Identity {
    let id = repo
        .users
        .create(&NewUser {
            username: username.to_string(),
            full_name: format!("{} name", username),
            password_hash: hash_password("secret").unwrap(),
            email: Some(format!("{}@library.test", username)),
            phone: None,
            address: None,
            role,
        })
        .await
        .unwrap();

    Identity {
        id,
        name: format!("{} name", username),
        username: username.to_string(),
        email: Some(format!("{}@library.test", username)),
        role,
    }
}

async fn add_book(repo: &Repository, title: &str, stock: i32) -> i32 {
    repo.books
        .create(&BookFields {
            title: title.to_string(),
            author: "Author".to_string(),
            publisher: None,
            year: Some("2001".to_string()),
            isbn: None,
            category: "Novel".to_string(),
            stock_count: stock,
            shelf_location: Some("A1".to_string()),
        })
        .await
        .unwrap()
}

async fn stock(repo: &Repository, book_id: i32) -> i32 {
    repo.books.get_by_id(book_id).await.unwrap().stock_count
}

fn checkout(user_id: i32, book_id: i32) -> Checkout {
    Checkout {
        user_id,
        book_id,
        borrowed_on: None,
        due_on: days_from_today(14),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn concurrent_checkouts_never_oversell(pool: PgPool) {
    let repo = Repository::new(pool);
    let staff = add_user(&repo, "staff", Role::Staff).await;
    let member = add_user(&repo, "member", Role::Member).await;
    let book = add_book(&repo, "Last Copy", 1).await;

    let req_a = checkout(member.id, book);
    let req_b = checkout(member.id, book);
    let (a, b) = tokio::join!(
        repo.loans.checkout(staff.id, &req_a),
        repo.loans.checkout(staff.id, &req_b),
    );

    let results = [a, b];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let out_of_stock = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::OutOfStock(_))))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(out_of_stock, 1);
    assert_eq!(stock(&repo, book).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn stock_round_trip(pool: PgPool) {
    let repo = Repository::new(pool);
    let staff = add_user(&repo, "staff", Role::Staff).await;
    let member = add_user(&repo, "member", Role::Member).await;
    let book = add_book(&repo, "Five Copies", 5).await;

    let mut loans = Vec::new();
    for _ in 0..5 {
        loans.push(repo.loans.checkout(staff.id, &checkout(member.id, book)).await.unwrap());
    }
    assert_eq!(stock(&repo, book).await, 0);

    let sixth = repo.loans.checkout(staff.id, &checkout(member.id, book)).await;
    assert!(matches!(sixth, Err(AppError::OutOfStock(_))));
    assert_eq!(stock(&repo, book).await, 0);

    repo.loans.mark_returned(staff.id, loans[0]).await.unwrap();
    assert_eq!(stock(&repo, book).await, 1);

    repo.loans.checkout(staff.id, &checkout(member.id, book)).await.unwrap();
    assert_eq!(stock(&repo, book).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn returning_twice_conflicts(pool: PgPool) {
    let repo = Repository::new(pool);
    let staff = add_user(&repo, "staff", Role::Staff).await;
    let member = add_user(&repo, "member", Role::Member).await;
    let book = add_book(&repo, "Returned Once", 2).await;

    let loan = repo.loans.checkout(staff.id, &checkout(member.id, book)).await.unwrap();
    repo.loans.mark_returned(staff.id, loan).await.unwrap();

    let again = repo.loans.mark_returned(staff.id, loan).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
    assert_eq!(stock(&repo, book).await, 2);

    let missing = repo.loans.mark_returned(staff.id, loan + 1000).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn deleting_loans_restores_stock_only_when_active(pool: PgPool) {
    let repo = Repository::new(pool);
    let staff = add_user(&repo, "staff", Role::Staff).await;
    let member = add_user(&repo, "member", Role::Member).await;
    let book = add_book(&repo, "Deletable", 3).await;

    let active = repo.loans.checkout(staff.id, &checkout(member.id, book)).await.unwrap();
    let returned = repo.loans.checkout(staff.id, &checkout(member.id, book)).await.unwrap();
    repo.loans.mark_returned(staff.id, returned).await.unwrap();
    assert_eq!(stock(&repo, book).await, 2);

    repo.loans.delete(staff.id, active).await.unwrap();
    assert_eq!(stock(&repo, book).await, 3);

    repo.loans.delete(staff.id, returned).await.unwrap();
    assert_eq!(stock(&repo, book).await, 3);

    assert!(matches!(
        repo.loans.delete(staff.id, active).await,
        Err(AppError::NotFound(_))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn checkout_checks_book_and_member(pool: PgPool) {
    let repo = Repository::new(pool);
    let staff = add_user(&repo, "staff", Role::Staff).await;
    let book = add_book(&repo, "Orphan", 1).await;

    let no_book = repo.loans.checkout(staff.id, &checkout(staff.id, book + 99)).await;
    assert!(matches!(no_book, Err(AppError::NotFound(_))));

    let no_member = repo.loans.checkout(staff.id, &checkout(staff.id + 99, book)).await;
    assert!(matches!(no_member, Err(AppError::NotFound(_))));
    assert_eq!(stock(&repo, book).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn extend_only_applies_to_active_loans(pool: PgPool) {
    let repo = Repository::new(pool);
    let staff = add_user(&repo, "staff", Role::Staff).await;
    let member = add_user(&repo, "member", Role::Member).await;
    let book = add_book(&repo, "Extended", 2).await;

    let loan = repo.loans.checkout(staff.id, &checkout(member.id, book)).await.unwrap();
    let new_due = days_from_today(30);
    repo.loans.extend(staff.id, loan, new_due).await.unwrap();
    assert_eq!(repo.loans.get_by_id(loan).await.unwrap().due_on, new_due);
    assert_eq!(stock(&repo, book).await, 1);

    repo.loans.mark_returned(staff.id, loan).await.unwrap();
    assert!(matches!(
        repo.loans.extend(staff.id, loan, new_due).await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        repo.loans.extend(staff.id, loan + 1000, new_due).await,
        Err(AppError::NotFound(_))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn book_with_active_loan_cannot_be_deleted(pool: PgPool) {
    let repo = Repository::new(pool);
    let staff = add_user(&repo, "staff", Role::Staff).await;
    let member = add_user(&repo, "member", Role::Member).await;
    let book = add_book(&repo, "Busy", 1).await;

    let loan = repo.loans.checkout(staff.id, &checkout(member.id, book)).await.unwrap();
    assert!(matches!(repo.books.delete(book).await, Err(AppError::Conflict(_))));

    repo.loans.mark_returned(staff.id, loan).await.unwrap();
    repo.books.delete(book).await.unwrap();

    assert!(matches!(repo.books.get_by_id(book).await, Err(AppError::NotFound(_))));
    assert!(matches!(repo.loans.get_by_id(loan).await, Err(AppError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn book_can_be_deleted_once_its_loan_is_deleted(pool: PgPool) {
    let repo = Repository::new(pool);
    let staff = add_user(&repo, "staff", Role::Staff).await;
    let member = add_user(&repo, "member", Role::Member).await;
    let book = add_book(&repo, "Reclaimed", 1).await;

    let loan = repo.loans.checkout(staff.id, &checkout(member.id, book)).await.unwrap();
    assert!(matches!(repo.books.delete(book).await, Err(AppError::Conflict(_))));

    repo.loans.delete(staff.id, loan).await.unwrap();
    assert_eq!(stock(&repo, book).await, 1);
    repo.books.delete(book).await.unwrap();

    assert!(matches!(repo.books.get_by_id(book).await, Err(AppError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn member_with_active_loan_cannot_be_deleted(pool: PgPool) {
    let repo = Repository::new(pool);
    let staff = add_user(&repo, "staff", Role::Staff).await;
    let member = add_user(&repo, "member", Role::Member).await;
    let book = add_book(&repo, "Held", 1).await;

    let loan = repo.loans.checkout(staff.id, &checkout(member.id, book)).await.unwrap();
    assert!(matches!(repo.users.delete(member.id).await, Err(AppError::Conflict(_))));

    repo.loans.mark_returned(staff.id, loan).await.unwrap();
    repo.users.delete(member.id).await.unwrap();
    assert_eq!(stock(&repo, book).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn category_in_use_cannot_be_deleted(pool: PgPool) {
    let services = services(&pool);
    let repo = &services.repository;
    let head = add_user(repo, "head", Role::Head).await;

    let novel = repo.categories.create("Novel", None).await.unwrap();
    let empty = repo.categories.create("Poetry", Some("Verse")).await.unwrap();
    add_book(repo, "Categorised", 1).await;

    assert!(matches!(
        services.catalog.delete_category(&head, novel).await,
        Err(AppError::Conflict(_))
    ));
    services.catalog.delete_category(&head, empty).await.unwrap();

    assert!(matches!(
        repo.categories.create("Novel", None).await,
        Err(AppError::Conflict(_))
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn staff_created_accounts_are_members(pool: PgPool) {
    let services = services(&pool);
    let staff = add_user(&services.repository, "staff", Role::Staff).await;
    let head = add_user(&services.repository, "head", Role::Head).await;

    let id = services
        .users
        .create(
            &staff,
            CreateUser {
                username: Some("NewHead".into()),
                nama_lengkap: Some("Would Be Head".into()),
                password: Some("pw".into()),
                role: Some("kepala_perpustakaan".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let created = services.users.get_by_id(id).await.unwrap();
    assert_eq!(created.role, Role::Member);
    assert_eq!(created.username, "newhead");

    let id = services
        .users
        .create(
            &head,
            CreateUser {
                username: Some("librarian2".into()),
                nama_lengkap: Some("Second Staff".into()),
                password: Some("pw".into()),
                role: Some("staff".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(services.users.get_by_id(id).await.unwrap().role, Role::Staff);

    let duplicate = services
        .users
        .create(
            &head,
            CreateUser {
                username: Some("LIBRARIAN2".into()),
                nama_lengkap: Some("Clash".into()),
                password: Some("pw".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn blank_email_is_stored_as_null(pool: PgPool) {
    let services = services(&pool);
    let staff = add_user(&services.repository, "staff", Role::Staff).await;

    let id = services
        .users
        .create(
            &staff,
            CreateUser {
                username: Some("noemail".into()),
                nama_lengkap: Some("No Email".into()),
                password: Some("pw".into()),
                email: Some("".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(services.users.get_by_id(id).await.unwrap().email, None);

    let malformed = services
        .users
        .create(
            &staff,
            CreateUser {
                username: Some("bademail".into()),
                nama_lengkap: Some("Bad Email".into()),
                password: Some("pw".into()),
                email: Some("not-an-email".into()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(malformed, Err(AppError::Validation { field: Some(f), .. }) if f == "email"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn login_accepts_username_or_email(pool: PgPool) {
    let services = services(&pool);
    add_user(&services.repository, "budi", Role::Member).await;

    let (token, identity) = services.auth.login("budi", "secret").await.unwrap();
    assert_eq!(identity.username, "budi");
    assert_eq!(services.auth.current(Some(&token)).await.unwrap(), Some(identity));

    let (_, identity) = services.auth.login("budi@library.test", "secret").await.unwrap();
    assert_eq!(identity.role, Role::Member);

    let wrong_password = services.auth.login("budi", "nope").await.unwrap_err();
    let unknown_user = services.auth.login("nobody", "secret").await.unwrap_err();
    match (wrong_password, unknown_user) {
        (AppError::Authentication(a), AppError::Authentication(b)) => assert_eq!(a, b),
        other => panic!("unexpected errors: {other:?}"),
    }

    services.auth.logout(Some(&token)).await.unwrap();
    assert_eq!(services.auth.current(Some(&token)).await.unwrap(), None);
}

/// Memory store that counts sessions still held
#[derive(Default)]
struct CountingStore {
    inner: MemorySessionStore,
    live: AtomicI64,
}

#[async_trait]
impl SessionStore for CountingStore {
    async fn put(&self, token: &str, identity: &Identity, ttl_seconds: u64) -> AppResult<()> {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.inner.put(token, identity, ttl_seconds).await
    }

    async fn get(&self, token: &str, ttl_seconds: u64) -> AppResult<Option<Identity>> {
        self.inner.get(token, ttl_seconds).await
    }

    async fn remove(&self, token: &str) -> AppResult<()> {
        self.live.fetch_sub(1, Ordering::SeqCst);
        self.inner.remove(token).await
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn login_without_audit_keeps_no_session(pool: PgPool) {
    let store = Arc::new(CountingStore::default());
    let services = Services::new(
        Repository::new(pool.clone()),
        SessionManager::new(store.clone(), 60),
    );
    add_user(&services.repository, "budi", Role::Member).await;

    sqlx::query("DROP TABLE activity_log").execute(&pool).await.unwrap();

    let result = services.auth.login("budi", "secret").await;
    assert!(matches!(result, Err(AppError::Database(_))));
    assert_eq!(store.live.load(Ordering::SeqCst), 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn dashboard_counts_overdue_loans(pool: PgPool) {
    let services = services(&pool);
    let repo = &services.repository;
    let staff = add_user(repo, "staff", Role::Staff).await;
    let member = add_user(repo, "member", Role::Member).await;
    let book = add_book(repo, "Popular", 10).await;

    let late = |days| Checkout {
        user_id: member.id,
        book_id: book,
        borrowed_on: Some(days_from_today(-20)),
        due_on: days_from_today(days),
    };

    repo.loans.checkout(staff.id, &late(-3)).await.unwrap();
    repo.loans.checkout(staff.id, &late(-1)).await.unwrap();
    repo.loans.checkout(staff.id, &late(7)).await.unwrap();
    let returned = repo.loans.checkout(staff.id, &late(-5)).await.unwrap();
    repo.loans.mark_returned(staff.id, returned).await.unwrap();

    let dashboard = services.dashboard.summary().await.unwrap();
    assert_eq!(dashboard.totals.books, 1);
    assert_eq!(dashboard.totals.available_books, 7);
    assert_eq!(dashboard.totals.members, 1);
    assert_eq!(dashboard.totals.active_loans, 3);
    assert_eq!(dashboard.totals.overdue_loans, 2);
    assert_eq!(dashboard.overdue.len(), 2);
    assert!(dashboard.overdue[0].due_on <= dashboard.overdue[1].due_on);
    assert_eq!(dashboard.recent.len(), 4);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn dashboard_counter_matches_list_during_checkouts(pool: PgPool) {
    let services = services(&pool);
    let repo = services.repository.clone();
    let staff = add_user(&repo, "staff", Role::Staff).await;
    let member = add_user(&repo, "member", Role::Member).await;
    let book = add_book(&repo, "Overdue Magnet", 20).await;

    let writer = tokio::spawn(async move {
        for _ in 0..20 {
            let loan = Checkout {
                user_id: member.id,
                book_id: book,
                borrowed_on: Some(days_from_today(-30)),
                due_on: days_from_today(-2),
            };
            repo.loans.checkout(staff.id, &loan).await.unwrap();
        }
    });

    for _ in 0..20 {
        let dashboard = services.dashboard.summary().await.unwrap();
        let listed = dashboard.overdue.len() as i64;
        assert_eq!(listed, dashboard.totals.overdue_loans.min(6));
        assert_eq!(
            dashboard.totals.available_books + dashboard.totals.active_loans,
            20
        );
    }
    writer.await.unwrap();

    let dashboard = services.dashboard.summary().await.unwrap();
    assert_eq!(dashboard.totals.overdue_loans, 20);
    assert_eq!(dashboard.overdue.len(), 6);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn ledger_writes_activity_entries(pool: PgPool) {
    let services = services(&pool);
    let repo = &services.repository;
    let staff = add_user(repo, "staff", Role::Staff).await;
    let member = add_user(repo, "member", Role::Member).await;
    let book = add_book(repo, "Logged", 1).await;

    let loan = repo.loans.checkout(staff.id, &checkout(member.id, book)).await.unwrap();
    let _ = repo.loans.checkout(staff.id, &checkout(member.id, book)).await;

    let entries = services.activity.latest().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].description, format!("Recorded loan #{}", loan));
    assert_eq!(entries[0].actor.as_deref(), Some("staff name"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn catalog_search_filters(pool: PgPool) {
    let repo = Repository::new(pool);
    add_book(&repo, "Bumi Manusia", 2).await;
    add_book(&repo, "Anak Semua Bangsa", 0).await;
    add_book(&repo, "Rumah Kaca", 1).await;

    let all = BookFilter {
        search: None,
        category: None,
        stock: None,
        pagination: Pagination::from_params(None, None, BookFilter::DEFAULT_LIMIT),
    };
    let titles: Vec<String> = repo.books.list(&all).await.unwrap().into_iter().map(|b| b.title).collect();
    assert_eq!(titles, vec!["Anak Semua Bangsa", "Bumi Manusia", "Rumah Kaca"]);

    let search = BookFilter {
        search: Some("manusia".into()),
        ..all.clone()
    };
    assert_eq!(repo.books.list(&search).await.unwrap().len(), 1);

    let empty = BookFilter {
        stock: Some(StockFilter::Empty),
        ..all.clone()
    };
    let books = repo.books.list(&empty).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Anak Semua Bangsa");

    let second_page = BookFilter {
        pagination: Pagination::from_params(Some("2"), Some("2"), BookFilter::DEFAULT_LIMIT),
        ..all
    };
    let books = repo.books.list(&second_page).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Rumah Kaca");
}
