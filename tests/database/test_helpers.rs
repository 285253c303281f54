use lazy_static::lazy_static;
use skill_rating::database::db_structs::Set;
use std::sync::Arc;
use testcontainers::{clients::Cli, Container};
use testcontainers_modules::postgres::Postgres;
use tokio_postgres::{Client, NoTls};

pub struct TestDatabase {
    pub connection_string: String,
    _container: Container<'static, Postgres>
}

impl TestDatabase {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Create a static CLI instance
        lazy_static! {
            static ref DOCKER: Arc<Cli> = Arc::new(Cli::default());
        }

        // Start PostgreSQL container
        let container = DOCKER.run(Postgres::default());
        let port = container.get_host_port_ipv4(5432);

        let connection_string = format!(
            "host=localhost port={} user=postgres password=postgres dbname=postgres",
            port
        );

        let db = TestDatabase {
            connection_string,
            _container: container
        };

        // Load and execute schema
        let schema = include_str!("schema.sql");
        db.get_client().await?.batch_execute(schema).await?;

        Ok(db)
    }

    pub async fn get_client(&self) -> Result<Client, Box<dyn std::error::Error>> {
        let (client, connection) = tokio_postgres::connect(&self.connection_string, NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                eprintln!("Database connection error: {}", e);
            }
        });

        Ok(client)
    }

    /// Inserts the sets with their scores, creating every player and guest they reference
    pub async fn seed_sets(&self, sets: &[Set]) -> Result<(), Box<dyn std::error::Error>> {
        let client = self.get_client().await?;

        for set in sets {
            client
                .execute(
                    "INSERT INTO sets (id, created_at) VALUES ($1, $2)",
                    &[&set.id, &set.created_at]
                )
                .await?;

            for score in &set.scores {
                let user_id = score.participant.user_id();
                let guest_id = score.participant.guest_id();

                if let Some(id) = user_id {
                    client
                        .execute(
                            "INSERT INTO players (id, name) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                            &[&id, &format!("Player{}", id)]
                        )
                        .await?;
                }
                if let Some(id) = guest_id {
                    client
                        .execute(
                            "INSERT INTO guests (id, name) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                            &[&id, &format!("Guest{}", id)]
                        )
                        .await?;
                }

                client
                    .execute(
                        "INSERT INTO set_scores (set_id, user_id, guest_id, games_won) VALUES ($1, $2, $3, $4)",
                        &[&set.id, &user_id, &guest_id, &score.games_won]
                    )
                    .await?;
            }
        }

        Ok(())
    }
}
