//! Integration tests for the reservation, transfer and process workflows.
//!
//! Each test builds its own users and CVs against a fresh database and
//! drives the repositories the way the handlers do.

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, Utc};
use placement_core::access::{Action, Actor};
use placement_core::error::CoreError;
use placement_core::roles::{Role, ROLE_AGENT, ROLE_RECRUITMENT, ROLE_SPONSOR};
use placement_core::status::{CvStatus, OfferStatus, TransferStatus};
use placement_core::types::DbId;
use placement_db::error::DbError;
use placement_db::models::cv::{CreateCv, Cv, CvListQuery};
use placement_db::models::offer::{CreateOffer, Offer};
use placement_db::models::session::{ClientInfo, NewSession};
use placement_db::models::transfer::{CreateTransfer, Transfer};
use placement_db::models::user::CreateUser;
use placement_db::repositories::{
    BaseRepo, CvRepo, NotificationRepo, OfferRepo, ProcessRepo, RoleRepo, SessionRepo,
    TransferRepo, UserRepo,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, username: &str, role: &str) -> Actor {
    let role_id = RoleRepo::id_of(pool, Role::parse(role).unwrap()).await.unwrap();
    let user = UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "not-a-real-hash".to_string(),
            role_id,
            company_name: None,
            phone: None,
        },
    )
    .await
    .unwrap();
    Actor::new(user.id, Role::parse(role).unwrap())
}

fn new_cv(passport: &str) -> CreateCv {
    CreateCv {
        full_name: "Maria Santos".to_string(),
        passport_number: passport.to_string(),
        nationality: "Philippines".to_string(),
        gender: "female".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1995, 5, 20).unwrap(),
        marital_status: Some("single".to_string()),
        religion: None,
        profession: "Housemaid".to_string(),
        experience_years: 4,
        languages: vec!["English".to_string(), "Tagalog".to_string()],
        expected_salary: Some(1500),
        summary: None,
        photo_url: None,
        passport_url: None,
        video_url: None,
    }
}

async fn offer_on(pool: &PgPool, employer: &Actor, cv_id: DbId) -> Offer {
    OfferRepo::create(
        pool,
        employer.user_id,
        &CreateOffer {
            cv_id,
            job_id: None,
            salary: Some(1600),
            message: Some("Start next month".to_string()),
        },
        Utc::now() + Duration::hours(72),
    )
    .await
    .unwrap()
}

async fn reload_cv(pool: &PgPool, id: DbId) -> Cv {
    BaseRepo::<Cv>::get(pool, id).await.unwrap()
}

// ---------------------------------------------------------------------------
// CVs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_cv_visibility_by_role(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let other_agent = new_user(&pool, "agent2", ROLE_AGENT).await;
    let sponsor = new_user(&pool, "sponsor1", ROLE_SPONSOR).await;

    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("P1234567")).await.unwrap();

    assert!(CvRepo::find_authorized(&pool, &agent, Action::Update, cv.id).await.is_ok());
    assert!(CvRepo::find_authorized(&pool, &sponsor, Action::Read, cv.id).await.is_ok());
    assert_matches!(
        CvRepo::find_authorized(&pool, &other_agent, Action::Read, cv.id).await,
        Err(DbError::Core(CoreError::Forbidden(_)))
    );
    assert_matches!(
        CvRepo::find_authorized(&pool, &sponsor, Action::Update, cv.id).await,
        Err(DbError::Core(CoreError::Forbidden(_)))
    );

    let today = Utc::now().date_naive();
    let own = CvRepo::list(&pool, &agent, &CvListQuery::default(), today).await.unwrap();
    assert_eq!(own.total, 1);
    let others = CvRepo::list(&pool, &other_agent, &CvListQuery::default(), today).await.unwrap();
    assert_eq!(others.total, 0);
    let browsing = CvRepo::list(&pool, &sponsor, &CvListQuery::default(), today).await.unwrap();
    assert_eq!(browsing.total, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cv_list_filters(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    CvRepo::create(&pool, agent.user_id, &new_cv("P0000001")).await.unwrap();
    let mut male = new_cv("P0000002");
    male.full_name = "Ahmed Karim".to_string();
    male.gender = "male".to_string();
    male.date_of_birth = NaiveDate::from_ymd_opt(1980, 1, 1).unwrap();
    CvRepo::create(&pool, agent.user_id, &male).await.unwrap();

    let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
    let query = CvListQuery {
        gender: Some("male".to_string()),
        ..Default::default()
    };
    let page = CvRepo::list(&pool, &agent, &query, today).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].full_name, "Ahmed Karim");

    let query = CvListQuery {
        max_age: Some(35),
        ..Default::default()
    };
    let page = CvRepo::list(&pool, &agent, &query, today).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].full_name, "Maria Santos");

    let query = CvListQuery {
        search: Some("kar".to_string()),
        ..Default::default()
    };
    assert_eq!(CvRepo::list(&pool, &agent, &query, today).await.unwrap().total, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_soft_deleted_cv_frees_passport(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("P7654321")).await.unwrap();

    assert!(CvRepo::passport_taken(&pool, "P7654321", None).await.unwrap());
    assert!(!CvRepo::passport_taken(&pool, "P7654321", Some(cv.id)).await.unwrap());

    let duplicate = CvRepo::create(&pool, agent.user_id, &new_cv("P7654321")).await;
    assert!(duplicate.is_err());

    CvRepo::delete(&pool, cv.id).await.unwrap();
    assert!(BaseRepo::<Cv>::find_by_id(&pool, cv.id).await.unwrap().is_none());
    assert!(CvRepo::create(&pool, agent.user_id, &new_cv("P7654321")).await.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_withdraw_and_publish(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("P1111111")).await.unwrap();

    let withdrawn = CvRepo::change_status(&pool, &cv, CvStatus::Withdrawn).await.unwrap();
    assert_eq!(withdrawn.status(), CvStatus::Withdrawn);
    assert_matches!(
        CvRepo::change_status(&pool, &withdrawn, CvStatus::Reserved).await,
        Err(DbError::Core(CoreError::Conflict(_)))
    );
    let published = CvRepo::change_status(&pool, &withdrawn, CvStatus::Available).await.unwrap();
    assert_eq!(published.status(), CvStatus::Available);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_rechecks_status_under_lock(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let sponsor = new_user(&pool, "sponsor1", ROLE_SPONSOR).await;
    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("PB123456")).await.unwrap();

    // Loaded while still available, reserved before the delete runs.
    let stale = CvRepo::find_authorized(&pool, &agent, Action::Delete, cv.id).await.unwrap();
    assert_eq!(stale.status(), CvStatus::Available);
    let offer = offer_on(&pool, &sponsor, cv.id).await;
    OfferRepo::accept(&pool, offer.id).await.unwrap();

    assert_matches!(
        CvRepo::delete(&pool, stale.id).await,
        Err(DbError::Core(CoreError::Conflict(msg))) if msg.contains("reserved")
    );
    assert_eq!(reload_cv(&pool, cv.id).await.status(), CvStatus::Reserved);
    assert!(ProcessRepo::find_by_cv(&pool, cv.id).await.unwrap().is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_cancels_pending_offers_and_transfer(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let sponsor = new_user(&pool, "sponsor1", ROLE_SPONSOR).await;
    let recruiter = new_user(&pool, "recruit1", ROLE_RECRUITMENT).await;
    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("PC123456")).await.unwrap();

    let offer = offer_on(&pool, &sponsor, cv.id).await;
    let transfer = TransferRepo::create(
        &pool,
        &CreateTransfer {
            cv_id: cv.id,
            to_user_id: recruiter.user_id,
            note: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(NotificationRepo::unread_count(&pool, sponsor.user_id).await.unwrap(), 0);
    assert_eq!(NotificationRepo::unread_count(&pool, recruiter.user_id).await.unwrap(), 1);

    CvRepo::delete(&pool, cv.id).await.unwrap();

    let offer = BaseRepo::<Offer>::get(&pool, offer.id).await.unwrap();
    assert_eq!(offer.status(), OfferStatus::Cancelled);
    let transfer = BaseRepo::<Transfer>::get(&pool, transfer.id).await.unwrap();
    assert_eq!(transfer.status(), TransferStatus::Cancelled);

    assert_eq!(NotificationRepo::unread_count(&pool, sponsor.user_id).await.unwrap(), 1);
    assert_eq!(NotificationRepo::unread_count(&pool, recruiter.user_id).await.unwrap(), 2);
    assert_matches!(
        OfferRepo::accept(&pool, offer.id).await,
        Err(DbError::Core(CoreError::NotFound { .. }))
    );
}

// ---------------------------------------------------------------------------
// Offers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_accept_offer_reserves_cv_and_rejects_competitors(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let sponsor = new_user(&pool, "sponsor1", ROLE_SPONSOR).await;
    let recruiter = new_user(&pool, "recruit1", ROLE_RECRUITMENT).await;
    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("P2222222")).await.unwrap();

    let winner = offer_on(&pool, &sponsor, cv.id).await;
    let loser = offer_on(&pool, &recruiter, cv.id).await;
    assert_eq!(winner.cv_owner_id, agent.user_id);
    assert_eq!(NotificationRepo::unread_count(&pool, agent.user_id).await.unwrap(), 2);

    let (accepted, process) = OfferRepo::accept(&pool, winner.id).await.unwrap();
    assert_eq!(accepted.status(), OfferStatus::Accepted);
    assert_eq!(process.completed_steps, 0);
    assert_eq!(process.employer_id, sponsor.user_id);

    assert_eq!(reload_cv(&pool, cv.id).await.status(), CvStatus::Reserved);
    let loser = BaseRepo::<Offer>::get(&pool, loser.id).await.unwrap();
    assert_eq!(loser.status(), OfferStatus::Rejected);

    assert_eq!(NotificationRepo::unread_count(&pool, sponsor.user_id).await.unwrap(), 1);
    assert_eq!(NotificationRepo::unread_count(&pool, recruiter.user_id).await.unwrap(), 1);

    // The reserving employer can now see the CV even though it is not available.
    assert!(CvRepo::find_authorized(&pool, &sponsor, Action::Read, cv.id).await.is_ok());
    assert_matches!(
        CvRepo::find_authorized(&pool, &recruiter, Action::Read, cv.id).await,
        Err(DbError::Core(CoreError::Forbidden(_)))
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_pending_offer_rejected(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let sponsor = new_user(&pool, "sponsor1", ROLE_SPONSOR).await;
    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("P3333333")).await.unwrap();

    offer_on(&pool, &sponsor, cv.id).await;
    let second = OfferRepo::create(
        &pool,
        sponsor.user_id,
        &CreateOffer {
            cv_id: cv.id,
            job_id: None,
            salary: None,
            message: None,
        },
        Utc::now() + Duration::hours(1),
    )
    .await;
    assert_matches!(
        second,
        Err(DbError::Sqlx(sqlx::Error::Database(e)))
            if e.constraint() == Some("uq_offers_pending_cv_employer")
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_expired_offer_cannot_be_accepted(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let sponsor = new_user(&pool, "sponsor1", ROLE_SPONSOR).await;
    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("P4444444")).await.unwrap();

    let offer = OfferRepo::create(
        &pool,
        sponsor.user_id,
        &CreateOffer {
            cv_id: cv.id,
            job_id: None,
            salary: None,
            message: None,
        },
        Utc::now() - Duration::minutes(1),
    )
    .await
    .unwrap();

    assert_matches!(
        OfferRepo::accept(&pool, offer.id).await,
        Err(DbError::Core(CoreError::Conflict(msg))) if msg.contains("expired")
    );
    let offer = BaseRepo::<Offer>::get(&pool, offer.id).await.unwrap();
    assert_eq!(offer.status(), OfferStatus::Expired);
    assert_eq!(reload_cv(&pool, cv.id).await.status(), CvStatus::Available);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_cancel_accepted_offer_releases_cv(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let sponsor = new_user(&pool, "sponsor1", ROLE_SPONSOR).await;
    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("P5555555")).await.unwrap();

    let offer = offer_on(&pool, &sponsor, cv.id).await;
    OfferRepo::accept(&pool, offer.id).await.unwrap();

    let cancelled = OfferRepo::cancel(&pool, offer.id).await.unwrap();
    assert_eq!(cancelled.status(), OfferStatus::Cancelled);
    assert_eq!(reload_cv(&pool, cv.id).await.status(), CvStatus::Available);
    assert!(ProcessRepo::find_by_cv(&pool, cv.id).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Process
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_process_walks_to_deployment(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let sponsor = new_user(&pool, "sponsor1", ROLE_SPONSOR).await;
    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("P6666666")).await.unwrap();
    let offer = offer_on(&pool, &sponsor, cv.id).await;
    OfferRepo::accept(&pool, offer.id).await.unwrap();

    let first = ProcessRepo::advance(&pool, cv.id, agent.user_id, Some("signed")).await.unwrap();
    assert_eq!(first.completed_steps, 1);
    assert!(first.started_at.is_some());
    assert_eq!(reload_cv(&pool, cv.id).await.status(), CvStatus::InProcess);

    // A process that has started can no longer be cancelled.
    assert_matches!(
        OfferRepo::cancel(&pool, offer.id).await,
        Err(DbError::Core(CoreError::Conflict(_)))
    );

    let mut last = first;
    for _ in 1..7 {
        last = ProcessRepo::advance(&pool, cv.id, agent.user_id, None).await.unwrap();
    }
    assert_eq!(last.completed_steps, 7);
    assert!(last.completed_at.is_some());
    assert_eq!(reload_cv(&pool, cv.id).await.status(), CvStatus::Deployed);

    assert_matches!(
        ProcessRepo::advance(&pool, cv.id, agent.user_id, None).await,
        Err(DbError::Core(CoreError::Conflict(_)))
    );

    let reverted = ProcessRepo::revert(&pool, cv.id, agent.user_id, None).await.unwrap();
    assert_eq!(reverted.completed_steps, 6);
    assert!(reverted.completed_at.is_none());
    assert_eq!(reload_cv(&pool, cv.id).await.status(), CvStatus::InProcess);

    let view = ProcessRepo::view(&pool, reverted).await.unwrap();
    assert_eq!(view.history.len(), 8);
    assert_eq!(view.history[0].step, "contract");
    assert_eq!(view.history[7].action, "reverted");
    assert_eq!(view.summary.progress_percent, 85);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_revert_to_start_returns_cv_to_reserved(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let sponsor = new_user(&pool, "sponsor1", ROLE_SPONSOR).await;
    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("PD123456")).await.unwrap();
    let offer = offer_on(&pool, &sponsor, cv.id).await;
    OfferRepo::accept(&pool, offer.id).await.unwrap();

    ProcessRepo::advance(&pool, cv.id, agent.user_id, None).await.unwrap();
    assert_eq!(reload_cv(&pool, cv.id).await.status(), CvStatus::InProcess);

    let reverted = ProcessRepo::revert(&pool, cv.id, agent.user_id, Some("wrong file"))
        .await
        .unwrap();
    assert_eq!(reverted.completed_steps, 0);
    assert_eq!(reload_cv(&pool, cv.id).await.status(), CvStatus::Reserved);
    assert_matches!(
        ProcessRepo::revert(&pool, cv.id, agent.user_id, None).await,
        Err(DbError::Core(CoreError::Conflict(_)))
    );

    // Back at step zero, the employer may withdraw again.
    let cancelled = OfferRepo::cancel(&pool, offer.id).await.unwrap();
    assert_eq!(cancelled.status(), OfferStatus::Cancelled);
    assert_eq!(reload_cv(&pool, cv.id).await.status(), CvStatus::Available);
    assert!(ProcessRepo::find_by_cv(&pool, cv.id).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_transfer_changes_owner_and_cancels_offers(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let recruiter = new_user(&pool, "recruit1", ROLE_RECRUITMENT).await;
    let sponsor = new_user(&pool, "sponsor1", ROLE_SPONSOR).await;
    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("P8888888")).await.unwrap();
    let offer = offer_on(&pool, &sponsor, cv.id).await;

    let transfer = TransferRepo::create(
        &pool,
        &CreateTransfer {
            cv_id: cv.id,
            to_user_id: recruiter.user_id,
            note: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(transfer.from_user_id, agent.user_id);

    let accepted = TransferRepo::accept(&pool, transfer.id).await.unwrap();
    assert_eq!(accepted.status(), TransferStatus::Accepted);
    assert_eq!(reload_cv(&pool, cv.id).await.owner_id, recruiter.user_id);

    let offer = BaseRepo::<Offer>::get(&pool, offer.id).await.unwrap();
    assert_eq!(offer.status(), OfferStatus::Cancelled);

    assert!(CvRepo::find_authorized(&pool, &recruiter, Action::Update, cv.id).await.is_ok());
    assert_matches!(
        CvRepo::find_authorized(&pool, &agent, Action::Update, cv.id).await,
        Err(DbError::Core(CoreError::Forbidden(_)))
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_offer_and_transfer_accepts_do_not_deadlock(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let recruiter = new_user(&pool, "recruit1", ROLE_RECRUITMENT).await;
    let sponsor = new_user(&pool, "sponsor1", ROLE_SPONSOR).await;
    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("PE123456")).await.unwrap();
    let offer = offer_on(&pool, &sponsor, cv.id).await;
    let transfer = TransferRepo::create(
        &pool,
        &CreateTransfer {
            cv_id: cv.id,
            to_user_id: recruiter.user_id,
            note: None,
        },
    )
    .await
    .unwrap();

    // Hold the CV so both workflows queue up behind it.
    let mut holder = pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM cvs WHERE id = $1 FOR UPDATE")
        .bind(cv.id)
        .execute(&mut *holder)
        .await
        .unwrap();

    let transfer_task = tokio::spawn({
        let pool = pool.clone();
        async move { TransferRepo::accept(&pool, transfer.id).await.map(|_| ()) }
    });
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let offer_task = tokio::spawn({
        let pool = pool.clone();
        async move { OfferRepo::accept(&pool, offer.id).await.map(|_| ()) }
    });
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    holder.commit().await.unwrap();

    let transfer_result = transfer_task.await.unwrap();
    let offer_result = offer_task.await.unwrap();

    // The transfer queued first and wins; the offer it cancelled is refused
    // with a domain error rather than a database failure.
    assert!(transfer_result.is_ok());
    assert_matches!(offer_result, Err(DbError::Core(CoreError::Conflict(_))));
    assert_eq!(reload_cv(&pool, cv.id).await.owner_id, recruiter.user_id);
    assert_eq!(reload_cv(&pool, cv.id).await.status(), CvStatus::Available);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_transfer_to_sponsor_rejected(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let sponsor = new_user(&pool, "sponsor1", ROLE_SPONSOR).await;
    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("P9999999")).await.unwrap();

    let result = TransferRepo::create(
        &pool,
        &CreateTransfer {
            cv_id: cv.id,
            to_user_id: sponsor.user_id,
            note: None,
        },
    )
    .await;
    assert_matches!(result, Err(DbError::Core(CoreError::Validation(_))));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_second_pending_transfer_conflicts(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let first = new_user(&pool, "recruit1", ROLE_RECRUITMENT).await;
    let second = new_user(&pool, "agent2", ROLE_AGENT).await;
    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("PA123456")).await.unwrap();

    let request = |to_user_id| CreateTransfer {
        cv_id: cv.id,
        to_user_id,
        note: None,
    };
    let pending = TransferRepo::create(&pool, &request(first.user_id)).await.unwrap();
    let duplicate = TransferRepo::create(&pool, &request(second.user_id)).await;
    assert_matches!(
        duplicate,
        Err(DbError::Sqlx(sqlx::Error::Database(e)))
            if e.constraint() == Some("uq_transfers_pending_cv")
    );

    let cancelled = TransferRepo::cancel(&pool, pending.id).await.unwrap();
    assert_eq!(cancelled.status(), TransferStatus::Cancelled);
    assert!(TransferRepo::create(&pool, &request(second.user_id)).await.is_ok());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_lapsed_offer_is_expired_and_frees_the_slot(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;
    let sponsor = new_user(&pool, "sponsor1", ROLE_SPONSOR).await;
    let cv = CvRepo::create(&pool, agent.user_id, &new_cv("P5555555")).await.unwrap();

    let lapsed = offer_on(&pool, &sponsor, cv.id).await;
    sqlx::query("UPDATE offers SET expires_at = NOW() - INTERVAL '1 hour' WHERE id = $1")
        .bind(lapsed.id)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(OfferRepo::expire_stale(&pool).await.unwrap(), 1);
    let lapsed = BaseRepo::<Offer>::get(&pool, lapsed.id).await.unwrap();
    assert_eq!(lapsed.status(), OfferStatus::Expired);

    // The pending-offer uniqueness no longer blocks the same employer.
    let fresh = offer_on(&pool, &sponsor, cv.id).await;
    assert_eq!(fresh.status(), OfferStatus::Pending);
    assert_eq!(OfferRepo::expire_stale(&pool).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Accounts and sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_failed_logins_lock_at_threshold(pool: PgPool) {
    let agent = new_user(&pool, "agent1", ROLE_AGENT).await;

    for expected in 1..5 {
        let failed = UserRepo::record_failed_login(&pool, agent.user_id, 5, 15).await.unwrap();
        assert_eq!(failed.failed_login_count, expected);
        assert!(failed.locked_until.is_none());
    }
    let failed = UserRepo::record_failed_login(&pool, agent.user_id, 5, 15).await.unwrap();
    let until = failed.locked_until.expect("fifth failure locks the account");
    assert!(until > Utc::now() + Duration::minutes(14));

    let user = UserRepo::find_by_id(&pool, agent.user_id).await.unwrap().unwrap();
    assert!(user.is_locked(Utc::now()));
    assert_eq!(user.role().unwrap(), Role::Agent);

    UserRepo::record_successful_login(&pool, agent.user_id).await.unwrap();
    let user = UserRepo::find_by_id(&pool, agent.user_id).await.unwrap().unwrap();
    assert!(!user.is_locked(Utc::now()));
    assert_eq!(user.failed_login_count, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_refresh_session_is_single_use(pool: PgPool) {
    let sponsor = new_user(&pool, "sponsor1", ROLE_SPONSOR).await;
    let open = |hash: &str| NewSession {
        user_id: sponsor.user_id,
        refresh_token_hash: hash.to_string(),
        expires_at: Utc::now() + Duration::days(7),
        client: ClientInfo::default(),
    };

    SessionRepo::open(&pool, &open("hash-a")).await.unwrap();
    assert_eq!(SessionRepo::consume(&pool, "hash-a").await.unwrap(), Some(sponsor.user_id));
    assert_eq!(SessionRepo::consume(&pool, "hash-a").await.unwrap(), None);
    assert_eq!(SessionRepo::consume(&pool, "unknown").await.unwrap(), None);

    SessionRepo::open(&pool, &open("hash-b")).await.unwrap();
    assert_eq!(SessionRepo::prune_for_user(&pool, sponsor.user_id).await.unwrap(), 1);
    assert_eq!(SessionRepo::revoke_all_for_user(&pool, sponsor.user_id).await.unwrap(), 1);
}
