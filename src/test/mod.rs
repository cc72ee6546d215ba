//! Service-level scenarios against the in-memory repositories.

use chrono::Utc;
use futures_util::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error::SystemError;
use crate::configs::RedisCache;
use crate::modules::friend::model::Decision;
use crate::modules::friend::rate_limit::RateLimitPolicy;
use crate::modules::friend::repository::{FriendRequestRepository, FriendshipRepository};
use crate::modules::friend::repository_mem::FriendRepositoryMem;
use crate::modules::friend::schema::{FriendRequestEntity, RequestStatus};
use crate::modules::friend::service::FriendService;
use crate::modules::user::repository_mem::UserRepositoryMem;
use crate::modules::user::service::UserService;

type MemFriendService = FriendService<FriendRepositoryMem, UserRepositoryMem>;

fn setup() -> (Arc<UserRepositoryMem>, Arc<FriendRepositoryMem>, MemFriendService) {
    let users = Arc::new(UserRepositoryMem::new());
    let friends = Arc::new(FriendRepositoryMem::new(users.clone()));
    let service = FriendService::with_dependencies(friends.clone(), users.clone());
    (users, friends, service)
}

#[actix_web::test]
async fn second_send_for_same_pair_conflicts() {
    let (users, _, service) = setup();
    let alice = users.add_user("alice", "alice@example.com");
    let bob = users.add_user("bob", "bob@example.com");

    let request = service.send_friend_request(alice, bob).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.created_at, request.updated_at);

    let err = service.send_friend_request(alice, bob).await.unwrap_err();
    assert!(matches!(err, SystemError::Conflict(_)));
}

#[actix_web::test]
async fn reverse_direction_stays_open_after_send() {
    let (users, _, service) = setup();
    let alice = users.add_user("alice", "alice@example.com");
    let bob = users.add_user("bob", "bob@example.com");

    service.send_friend_request(alice, bob).await.unwrap();
    // the ordered pair is taken, the reverse one is not
    service.send_friend_request(bob, alice).await.unwrap();
}

#[actix_web::test]
async fn accept_creates_one_friendship_listed_both_ways() {
    let (users, friends, service) = setup();
    let alice = users.add_user("alice", "alice@example.com");
    let bob = users.add_user("bob", "bob@example.com");

    let request = service.send_friend_request(alice, bob).await.unwrap();

    let pending = service.get_pending_requests(bob).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, request.id);

    let updated = service.respond_to_request(bob, request.id, Decision::Accept).await.unwrap();
    assert_eq!(updated.status, RequestStatus::Accepted);

    assert_eq!(friends.friendship_count(), 1);
    assert!(friends.find_friendship(&alice, &bob).await.unwrap().is_some());

    let of_alice = service.get_friends(alice).await.unwrap();
    let of_bob = service.get_friends(bob).await.unwrap();
    assert!(of_alice.iter().any(|f| f.id == bob));
    assert!(of_bob.iter().any(|f| f.id == alice));

    // accepted requests leave the pending inbox
    assert!(service.get_pending_requests(bob).await.unwrap().is_empty());
}

#[actix_web::test]
async fn reject_creates_no_friendship_and_keeps_request() {
    let (users, friends, service) = setup();
    let alice = users.add_user("alice", "alice@example.com");
    let bob = users.add_user("bob", "bob@example.com");

    let request = service.send_friend_request(alice, bob).await.unwrap();
    let updated = service.respond_to_request(bob, request.id, Decision::Reject).await.unwrap();

    assert_eq!(updated.status, RequestStatus::Rejected);
    assert_eq!(friends.friendship_count(), 0);
    assert!(service.get_friends(alice).await.unwrap().is_empty());

    let stored = friends.find_friend_request_by_id(&request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Rejected);

    // a rejected request still occupies the ordered pair
    let err = service.send_friend_request(alice, bob).await.unwrap_err();
    assert!(matches!(err, SystemError::Conflict(_)));
}

#[actix_web::test]
async fn double_response_conflicts_and_never_duplicates_friendship() {
    let (users, friends, service) = setup();
    let alice = users.add_user("alice", "alice@example.com");
    let bob = users.add_user("bob", "bob@example.com");

    let request = service.send_friend_request(alice, bob).await.unwrap();
    service.respond_to_request(bob, request.id, Decision::Accept).await.unwrap();

    let again = service.respond_to_request(bob, request.id, Decision::Accept).await.unwrap_err();
    assert!(matches!(again, SystemError::Conflict(_)));

    let flip = service.respond_to_request(bob, request.id, Decision::Reject).await.unwrap_err();
    assert!(matches!(flip, SystemError::Conflict(_)));

    assert_eq!(friends.friendship_count(), 1);
    let stored = friends.find_friend_request_by_id(&request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Accepted);
}

#[actix_web::test]
async fn respond_by_non_addressee_is_not_found() {
    let (users, _, service) = setup();
    let alice = users.add_user("alice", "alice@example.com");
    let bob = users.add_user("bob", "bob@example.com");
    let carol = users.add_user("carol", "carol@example.com");

    let request = service.send_friend_request(alice, bob).await.unwrap();

    let err = service.respond_to_request(carol, request.id, Decision::Accept).await.unwrap_err();
    assert!(matches!(err, SystemError::NotFound(_)));

    // the sender cannot respond to their own request either
    let err = service.respond_to_request(alice, request.id, Decision::Accept).await.unwrap_err();
    assert!(matches!(err, SystemError::NotFound(_)));
}

#[actix_web::test]
async fn self_request_is_rejected() {
    let (users, _, service) = setup();
    let alice = users.add_user("alice", "alice@example.com");

    let err = service.send_friend_request(alice, alice).await.unwrap_err();
    assert!(matches!(err, SystemError::BadRequest(_)));
}

#[actix_web::test]
async fn send_to_unknown_user_is_not_found() {
    let (users, _, service) = setup();
    let alice = users.add_user("alice", "alice@example.com");
    let ghost = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));

    let err = service.send_friend_request(alice, ghost).await.unwrap_err();
    assert!(matches!(err, SystemError::NotFound(_)));
}

#[actix_web::test]
async fn send_between_existing_friends_conflicts() {
    let (users, _, service) = setup();
    let alice = users.add_user("alice", "alice@example.com");
    let bob = users.add_user("bob", "bob@example.com");

    let request = service.send_friend_request(alice, bob).await.unwrap();
    service.respond_to_request(bob, request.id, Decision::Accept).await.unwrap();

    let err = service.send_friend_request(bob, alice).await.unwrap_err();
    assert!(matches!(err, SystemError::Conflict(_)));
}

#[actix_web::test]
async fn fourth_send_within_window_is_rate_limited() {
    let (users, _, service) = setup();
    let alice = users.add_user("alice", "alice@example.com");
    let targets: Vec<Uuid> = (0..4)
        .map(|i| users.add_user(&format!("target{i}"), &format!("target{i}@example.com")))
        .collect();

    for target in &targets[..3] {
        service.send_friend_request(alice, *target).await.unwrap();
    }

    let err = service.send_friend_request(alice, targets[3]).await.unwrap_err();
    assert!(matches!(err, SystemError::TooManyRequests(_)));
}

#[actix_web::test]
async fn window_rolls_once_the_oldest_send_ages_out() {
    let (users, friends, service) = setup();
    let alice = users.add_user("alice", "alice@example.com");
    let targets: Vec<Uuid> = (0..5)
        .map(|i| users.add_user(&format!("target{i}"), &format!("target{i}@example.com")))
        .collect();

    let mut sent: Vec<FriendRequestEntity> = Vec::new();
    for target in &targets[..3] {
        sent.push(service.send_friend_request(alice, *target).await.unwrap());
    }

    // 61 seconds later the first send no longer counts
    friends.backdate_request(&sent[0].id, 61);

    service.send_friend_request(alice, targets[3]).await.unwrap();

    // the window is full again
    let err = service.send_friend_request(alice, targets[4]).await.unwrap_err();
    assert!(matches!(err, SystemError::TooManyRequests(_)));
}

#[actix_web::test]
async fn store_enforces_window_without_service_precheck() {
    let (users, friends, _) = setup();
    let alice = users.add_user("alice", "alice@example.com");
    let policy = RateLimitPolicy::default();

    for i in 0..3 {
        let target = users.add_user(&format!("t{i}"), &format!("t{i}@example.com"));
        friends
            .create_friend_request(
                &alice,
                &target,
                policy.window_start(Utc::now()),
                policy.max_requests,
            )
            .await
            .unwrap();
    }

    let target = users.add_user("t3", "t3@example.com");
    let err = friends
        .create_friend_request(
            &alice,
            &target,
            policy.window_start(Utc::now()),
            policy.max_requests,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SystemError::TooManyRequests(_)));
}

#[actix_web::test]
async fn rate_limiter_allows_once_window_rolls() {
    let (users, friends, service) = setup();
    let alice = users.add_user("alice", "alice@example.com");

    let mut sent = Vec::new();
    for i in 0..3 {
        let target = users.add_user(&format!("t{i}"), &format!("t{i}@example.com"));
        sent.push(service.send_friend_request(alice, target).await.unwrap());
    }

    let policy = RateLimitPolicy::default();
    let now = Utc::now();
    let recent =
        friends.count_recent_requests(&alice, policy.window_start(now)).await.unwrap();
    assert_eq!(recent, 3);
    assert!(!policy.admits(recent));

    for request in &sent {
        friends.backdate_request(&request.id, policy.window_secs + 1);
    }

    let recent = friends
        .count_recent_requests(&alice, policy.window_start(Utc::now()))
        .await
        .unwrap();
    assert_eq!(recent, 0);
    assert!(policy.admits(recent));
}

#[actix_web::test]
async fn concurrent_sends_for_one_pair_have_a_single_winner() {
    let (users, _, service) = setup();
    let alice = users.add_user("alice", "alice@example.com");
    let bob = users.add_user("bob", "bob@example.com");

    let attempts = join_all(
        (0..10).map(|_| service.send_friend_request(alice, bob)).collect::<Vec<_>>(),
    )
    .await;

    let successes = attempts.iter().filter(|r| r.is_ok()).count();
    let conflicts = attempts
        .iter()
        .filter(|r| matches!(r, Err(SystemError::Conflict(_))))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 9);
}

#[actix_web::test]
async fn concurrent_accepts_create_a_single_friendship() {
    let (users, friends, service) = setup();
    let alice = users.add_user("alice", "alice@example.com");
    let bob = users.add_user("bob", "bob@example.com");

    let request = service.send_friend_request(alice, bob).await.unwrap();

    let attempts = join_all(
        (0..10)
            .map(|_| service.respond_to_request(bob, request.id, Decision::Accept))
            .collect::<Vec<_>>(),
    )
    .await;

    let successes = attempts.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert_eq!(friends.friendship_count(), 1);
}

static TEST_ENV: std::sync::Once = std::sync::Once::new();

fn test_env() {
    TEST_ENV.call_once(|| {
        if std::env::var("SECRET_KEY").is_err() {
            std::env::set_var("SECRET_KEY", "test-secret");
            std::env::set_var("DATABASE_URL", "postgres://localhost/socialnetwork_test");
            std::env::set_var("REDIS_URL", "redis://127.0.0.1:6379");
        }
    });
}

#[actix_web::test]
async fn search_matches_username_substring_and_exact_email() {
    test_env();

    let users = Arc::new(UserRepositoryMem::new());
    users.add_user("bob123", "bobby@example.com");
    users.add_user("rob", "rob@x.com");
    users.add_user("robert", "bob@x.com");

    let cache = Arc::new(RedisCache::new().await.unwrap());
    let service = UserService::with_dependencies(users.clone(), cache);

    let hits = service.search_users("bob", 1, 20).await.unwrap();
    let usernames: Vec<&str> = hits.iter().map(|u| u.username.as_str()).collect();

    // substring on username and exact email, but not "rob@x.com"
    assert_eq!(usernames, vec!["bob123", "robert"]);
    assert!(!hits.iter().any(|u| u.email == "rob@x.com"));
}

#[actix_web::test]
async fn search_paginates() {
    test_env();

    let users = Arc::new(UserRepositoryMem::new());
    for i in 0..5 {
        users.add_user(&format!("bob{i}"), &format!("bob{i}@example.com"));
    }

    let cache = Arc::new(RedisCache::new().await.unwrap());
    let service = UserService::with_dependencies(users.clone(), cache);

    let first = service.search_users("bob", 1, 2).await.unwrap();
    let second = service.search_users("bob", 2, 2).await.unwrap();
    let third = service.search_users("bob", 3, 2).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    assert_eq!(third.len(), 1);
    assert_ne!(first[0].id, second[0].id);
}
