//! Feed and mutation properties exercised through the library, against a
//! real on-disk database.

use fiuggigram::db;
use fiuggigram::extractors::LikedCookies;
use fiuggigram::feed::assemble_feed;
use fiuggigram::posts::{create_post, create_reply, toggle_like, ReplyOutcome};
use fiuggigram::state::DbPool;
use tempfile::TempDir;

fn test_pool() -> (TempDir, DbPool) {
    let tmp = TempDir::new().unwrap();
    let pool = db::create_pool(&tmp.path().join("test.db")).expect("pool");
    db::run_migrations(&pool).expect("migrations");
    (tmp, pool)
}

#[test]
fn new_post_leads_the_feed() {
    let (_tmp, pool) = test_pool();
    let conn = pool.get().unwrap();

    let first = create_post(&conn, "Anna", "il primo momento").unwrap();
    let second = create_post(&conn, "Bruno", "il secondo momento").unwrap();

    let feed = assemble_feed(&conn, &LikedCookies::default()).unwrap();
    assert_eq!(feed.len(), 2);
    // Same-second inserts fall back to id order, newest still first.
    assert_eq!(feed[0].post.id, second);
    assert_eq!(feed[1].post.id, first);
    assert_eq!(feed[0].post.like_count, 0);
}

#[test]
fn replies_nest_one_level_and_stay_in_order() {
    let (_tmp, pool) = test_pool();
    let conn = pool.get().unwrap();

    let parent = create_post(&conn, "Anna", "Ciao a tutti").unwrap();
    let ReplyOutcome::Created(r1) = create_reply(&conn, parent, "benvenuta").unwrap() else {
        panic!("first reply should be created");
    };
    let ReplyOutcome::Created(r2) = create_reply(&conn, parent, "ciao!").unwrap() else {
        panic!("second reply should be created");
    };

    // The invariant is explicit: a reply cannot be replied to.
    assert_eq!(create_reply(&conn, r1, "troppo profondo").unwrap(), ReplyOutcome::Rejected);

    let feed = assemble_feed(&conn, &LikedCookies::default()).unwrap();
    assert_eq!(feed.len(), 1);
    let replies: Vec<i64> = feed[0].replies.iter().map(|r| r.id).collect();
    assert_eq!(replies, vec![r1, r2]);
}

#[test]
fn toggle_count_is_cookie_independent() {
    let (_tmp, pool) = test_pool();
    let conn = pool.get().unwrap();
    let id = create_post(&conn, "Anna", "Ciao").unwrap();

    // Two distinct fingerprints like the post.
    assert_eq!(toggle_like(&conn, id, "fp-one").unwrap().count, 1);
    assert_eq!(toggle_like(&conn, id, "fp-two").unwrap().count, 2);

    // A browser with no cookies still sees the full count, unliked.
    let feed = assemble_feed(&conn, &LikedCookies::default()).unwrap();
    assert_eq!(feed[0].post.like_count, 2);
    assert!(!feed[0].post.is_liked);

    // An even number of toggles is a no-op on the table.
    toggle_like(&conn, id, "fp-one").unwrap();
    toggle_like(&conn, id, "fp-two").unwrap();
    let feed = assemble_feed(&conn, &LikedCookies::default()).unwrap();
    assert_eq!(feed[0].post.like_count, 0);
}

#[test]
fn likes_on_replies_are_counted_too() {
    let (_tmp, pool) = test_pool();
    let conn = pool.get().unwrap();

    let parent = create_post(&conn, "Anna", "Ciao").unwrap();
    let ReplyOutcome::Created(reply) = create_reply(&conn, parent, "risposta").unwrap() else {
        panic!("reply should be created");
    };
    toggle_like(&conn, reply, "fp-one").unwrap();

    let feed = assemble_feed(&conn, &LikedCookies::from_ids(&[reply])).unwrap();
    assert_eq!(feed[0].replies[0].like_count, 1);
    assert!(feed[0].replies[0].is_liked);
    assert!(!feed[0].post.is_liked);
}
