use chrono::{TimeZone, Utc};
use credo::prelude::*;

mod users;

use users::{User, UserId, UserRepo, SCHEMA};

fn sample(n: u32) -> Result<User, DataError> {
    let birth_date = Utc
        .with_ymd_and_hms(1990 + n as i32, n % 12 + 1, 10 + n, 0, 0, 0)
        .single()
        .ok_or_else(|| DataError::decode("birth_date", format!("no date for sample {n}")))?;
    Ok(User {
        id: UserId(format!("u{n}")),
        first_name: format!("First{n}"),
        last_name: (n % 2 == 0).then(|| format!("Last{n}")),
        birth_date,
    })
}

async fn run() -> Result<(), DataError> {
    let config = DatabaseConfig::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config.yaml"))?;
    let users = UserRepo::new(SqlxExecutor::connect(&config).await?)?;
    users.init_schema(SCHEMA).await?;

    for n in 0..5 {
        users.create(&sample(n)?).await?;
    }
    tracing::info!(count = users.count().await?, "users created");

    let u1 = users.get_by_id(&UserId("u1".into())).await?;
    tracing::info!(?u1, birth_date = %u1.birth_date.date_naive(), "fetched by id");

    let picked = users
        .get_by_ids(&[UserId("u3".into()), UserId("u0".into()), UserId("missing".into())])
        .await?;
    tracing::info!(ids = ?picked.iter().map(|u| u.id.to_string()).collect::<Vec<_>>(), "fetched by ids");

    let mut renamed = u1.clone();
    renamed.first_name = "Renamed".into();
    let res = users.update(&renamed.id, &renamed).await?;
    tracing::info!(rows_affected = res.rows_affected()?, "updated");

    let page = users
        .get_page(PageRequest::new().page_number(1).page_size(2))
        .await?;
    tracing::info!(
        number = page.number,
        size = page.size,
        total = page.total,
        total_pages = page.total_pages,
        "second page"
    );
    for user in &page.content {
        tracing::info!(id = %user.id, first_name = %user.first_name, "page item");
    }

    let counts = users.count_by_last_name_exists().await?;
    tracing::info!(?counts, "count by last name");

    users.delete(&UserId("u4".into())).await?;
    users.delete_all().await?;
    tracing::info!(count = users.count().await?, "table emptied");

    users.executor().close().await;
    Ok(())
}

#[tokio::main]
async fn main() {
    credo::init_tracing();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "users demo failed");
        std::process::exit(1);
    }
}
