//! Integration tests for `DieselCartRepository` against embedded PostgreSQL.
//!
//! The upsert relies on the `cart_items_session_album_key` constraint and a
//! saturating SQL expression, neither of which the in-memory store exercises.

use pg_embedded_setup_unpriv::TestCluster;
use rstest::{fixture, rstest};
use storefront::domain::ports::CartRepository;
use storefront::domain::{AlbumDetails, AlbumId, CartSessionId, Price, Quantity};
use storefront::outbound::persistence::{
    DbPool, DieselCartRepository, MigrationSet, PoolConfig, run_migrations,
};
use tokio::runtime::Runtime;

mod support;

use support::pg_embed::test_cluster;
use support::{handle_cluster_setup_failure, reset_database};

const TEST_DB: &str = "diesel_cart_repo_test";

struct TestContext {
    runtime: Runtime,
    _cluster: TestCluster,
    repository: DieselCartRepository,
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = test_cluster()?;
    let database_url = reset_database(&cluster, TEST_DB)?;
    let pool = runtime
        .block_on(async {
            run_migrations(&database_url, MigrationSet::Cart)
                .await
                .map_err(|err| err.to_string())?;
            DbPool::new(PoolConfig::new(&database_url).with_max_size(2))
                .await
                .map_err(|err| err.to_string())
        })?;
    Ok(TestContext {
        runtime,
        _cluster: cluster,
        repository: DieselCartRepository::new(pool),
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn album(name: &str) -> AlbumDetails {
    AlbumDetails {
        album_id: AlbumId::new(7),
        album_name: name.to_owned(),
        artist: "Slayer".to_owned(),
        price: Price::parse("18.50").expect("price"),
        cover_url: Some("/static/uploads/reign.png".to_owned()),
    }
}

fn qty(raw: i64) -> Quantity {
    Quantity::new(raw).expect("quantity")
}

#[rstest]
fn repeated_adds_accumulate_on_one_line(repo_context: Option<TestContext>) {
    let Some(ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: repeated_adds_accumulate_on_one_line skipped");
        return;
    };
    let repo = ctx.repository.clone();
    let session = CartSessionId::generate();

    let (first, second, lines) = ctx.runtime.block_on(async {
        let first = repo.add(&session, &album("Reign in Blood"), qty(2)).await.expect("first add");
        let second = repo.add(&session, &album("Renamed"), qty(3)).await.expect("second add");
        let lines = repo.list(&session).await.expect("list");
        (first, second, lines)
    });

    assert_eq!(first.id, second.id);
    assert_eq!(second.quantity.get(), 5);
    assert_eq!(lines.len(), 1);
    let line = lines.first().expect("one line");
    assert_eq!(line.quantity.get(), 5);
    assert_eq!(line.album.album_name, "Reign in Blood");
    assert_eq!(line.album.price, Price::parse("18.50").expect("price"));
}

#[rstest]
fn accumulated_quantities_saturate_at_the_column_maximum(repo_context: Option<TestContext>) {
    let Some(ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: accumulated_quantities_saturate_at_the_column_maximum skipped");
        return;
    };
    let repo = ctx.repository.clone();
    let session = CartSessionId::generate();

    let line = ctx.runtime.block_on(async {
        repo.add(&session, &album("Reign in Blood"), qty(i64::from(i32::MAX)))
            .await
            .expect("first add");
        repo.add(&session, &album("Reign in Blood"), qty(5))
            .await
            .expect("saturating add")
    });

    assert_eq!(i64::from(line.quantity.get()), i64::from(i32::MAX));
}

#[rstest]
fn sessions_do_not_see_each_others_lines(repo_context: Option<TestContext>) {
    let Some(ctx) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: sessions_do_not_see_each_others_lines skipped");
        return;
    };
    let repo = ctx.repository.clone();
    let mine = CartSessionId::generate();
    let theirs = CartSessionId::generate();

    ctx.runtime.block_on(async {
        let line = repo.add(&mine, &album("Reign in Blood"), qty(1)).await.expect("add mine");
        repo.add(&theirs, &album("Reign in Blood"), qty(4)).await.expect("add theirs");

        assert!(!repo.set_quantity(&theirs, line.id, qty(9)).await.expect("foreign update"));
        assert!(!repo.remove(&theirs, line.id).await.expect("foreign remove"));
        assert!(repo.set_quantity(&mine, line.id, qty(9)).await.expect("own update"));

        assert_eq!(repo.clear(&mine).await.expect("clear"), 1);
        assert!(repo.list(&mine).await.expect("list mine").is_empty());
        let remaining = repo.list(&theirs).await.expect("list theirs");
        assert_eq!(remaining.first().map(|line| line.quantity.get()), Some(4));
    });
}
