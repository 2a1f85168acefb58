//! `migrate` command: manage the question bank schema.

use console::style;
use sea_orm::DatabaseConnection;
use topicsync::migration::{Migrator, MigratorTrait};
use topicsync::{LicenseTier, db, repository};

use crate::MigrateAction;

/// One migration and whether it has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MigrationRow {
    name: String,
    applied: bool,
}

async fn migration_rows(
    db: &DatabaseConnection,
) -> Result<Vec<MigrationRow>, Box<dyn std::error::Error>> {
    let applied = Migrator::get_applied_migrations(db).await?;
    let pending = Migrator::get_pending_migrations(db).await?;

    let mut rows: Vec<MigrationRow> = applied
        .iter()
        .map(|m| MigrationRow {
            name: m.name().to_string(),
            applied: true,
        })
        .chain(pending.iter().map(|m| MigrationRow {
            name: m.name().to_string(),
            applied: false,
        }))
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(rows)
}

/// Questions per tier, or `None` while the table does not exist yet.
async fn question_counts(db: &DatabaseConnection) -> Option<Vec<(LicenseTier, u64)>> {
    let mut counts = Vec::with_capacity(LicenseTier::ALL.len());
    for tier in LicenseTier::ALL {
        match repository::count(db, Some(tier)).await {
            Ok(n) => counts.push((tier, n)),
            Err(e) => {
                tracing::debug!(error = %e, "Could not count questions");
                return None;
            }
        }
    }
    Some(counts)
}

async fn print_status(db: &DatabaseConnection) -> Result<(), Box<dyn std::error::Error>> {
    let rows = migration_rows(db).await?;
    println!("{}", style("Migrations").bold());
    for row in &rows {
        let state = if row.applied {
            style("applied").green()
        } else {
            style("pending").yellow()
        };
        println!("  {:<40} {}", row.name, state);
    }

    match question_counts(db).await {
        Some(counts) => {
            let total: u64 = counts.iter().map(|(_, n)| n).sum();
            println!("\n{} {}", style("Questions").bold(), total);
            for (tier, n) in counts {
                println!("  {:<12} {}", tier.as_str(), n);
            }
        }
        None => println!("\n{}", style("Questions table not created yet").dim()),
    }
    Ok(())
}

pub(crate) async fn handle_migrate(
    action: MigrateAction,
    database_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = db::connect(database_url).await?;

    match action {
        MigrateAction::Up => {
            let pending = Migrator::get_pending_migrations(&db).await?;
            if pending.is_empty() {
                println!("Schema is up to date.");
            } else {
                for m in &pending {
                    println!("Applying {}", style(m.name()).cyan());
                }
                Migrator::up(&db, None).await?;
                tracing::info!(applied = pending.len(), "Migrations applied");
            }
        }
        MigrateAction::Down => {
            let Some(last) = Migrator::get_applied_migrations(&db).await?.pop() else {
                println!("Nothing to roll back.");
                return Ok(());
            };
            println!("Rolling back {}", style(last.name()).cyan());
            Migrator::down(&db, Some(1)).await?;
        }
        MigrateAction::Status => print_status(&db).await?,
        MigrateAction::Fresh => {
            println!(
                "{}",
                style("Dropping the question bank and reapplying migrations").red()
            );
            Migrator::fresh(&db).await?;
            tracing::info!("Fresh schema created");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rows_report_questions_migration_by_name() {
        let db = db::connect("sqlite::memory:").await.unwrap();

        let before = migration_rows(&db).await.unwrap();
        assert_eq!(before.len(), 1);
        assert!(before[0].name.ends_with("create_questions"));
        assert!(!before[0].applied);
        assert!(question_counts(&db).await.is_none());

        Migrator::up(&db, None).await.unwrap();

        let after = migration_rows(&db).await.unwrap();
        assert_eq!(after[0].name, before[0].name);
        assert!(after[0].applied);
    }

    #[tokio::test]
    async fn test_counts_are_per_tier() {
        let db = topicsync::connect_and_migrate("sqlite::memory:").await.unwrap();

        let counts = question_counts(&db).await.unwrap();
        assert_eq!(counts.len(), 3);
        assert!(counts.iter().all(|(_, n)| *n == 0));
    }
}
