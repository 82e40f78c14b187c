use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use social_blog_server::application::auth_service::{AuthService, SuperuserOutcome};
use social_blog_server::application::post_service::PostService;
use social_blog_server::data::post_repository::PostgresPostRepository;
use social_blog_server::data::profile_repository::{PostgresProfileRepository, ProfileRepository};
use social_blog_server::data::user_repository::{PostgresUserRepository, UserRepository};
use social_blog_server::domain::page::PageRequest;
use social_blog_server::domain::post::PostFilter;
use social_blog_server::infrastructure::config::AppConfig;
use social_blog_server::infrastructure::database::{create_pool, run_migrations};
use social_blog_server::infrastructure::logging::{LogFormat, init_logging};
use social_blog_server::infrastructure::security::JwtKeys;
use tracing::info;

/// Management commands run against the server's database.
#[derive(Parser, Debug)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Creates a staff account, or resets the password of an existing one.
    CreateSuperuser {
        #[clap(long, default_value = "admin")]
        username: String,
        #[clap(long, default_value = "admin@example.com")]
        email: String,
        #[clap(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[clap(long)]
        reset_password: bool,
    },
    /// Prints how many posts exist and the newest few.
    CheckPosts,
    /// Creates profile rows for users that have none.
    CreateMissingProfiles,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LogFormat::from_env_or(LogFormat::Compact));
    let args = Cli::parse();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url, 2)
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool).await?;

    let users = Arc::new(PostgresUserRepository::new(pool.clone()));
    let profiles = Arc::new(PostgresProfileRepository::new(pool.clone()));

    match args.command {
        Command::CreateSuperuser {
            username,
            email,
            password,
            reset_password,
        } => {
            let Some(password) = password else {
                bail!("a password is required: pass --password or set ADMIN_PASSWORD");
            };
            let auth = AuthService::new(
                users,
                profiles,
                JwtKeys::new(config.jwt_secret.clone(), config.token_ttl_seconds),
            );
            match auth
                .ensure_superuser(&username, &email, &password, reset_password)
                .await?
            {
                SuperuserOutcome::Created => println!("Superuser '{username}' created."),
                SuperuserOutcome::PasswordReset => {
                    println!("Password for superuser '{username}' reset.")
                }
                SuperuserOutcome::AlreadyExists => println!(
                    "Superuser '{username}' already exists. Use --reset-password to change its password."
                ),
            }
        }
        Command::CheckPosts => {
            let posts = PostService::new(Arc::new(PostgresPostRepository::new(pool.clone())));
            let page = posts
                .get_posts(PostFilter::default(), PageRequest::default())
                .await?;
            println!("Total posts: {}", page.total);

            if page.items.is_empty() {
                let candidates = users.list(5).await?;
                println!("No posts yet. Users who could author one ({}):", candidates.len());
                for user in candidates {
                    println!("- {} <{}>", user.username, user.email);
                }
            } else {
                for post in page.items {
                    println!(
                        "- [{}] {} (by {}, {} views)",
                        post.id, post.title, post.author_id, post.view_count
                    );
                }
            }
        }
        Command::CreateMissingProfiles => {
            let created = profiles.create_missing().await?;
            for username in &created {
                println!("Created profile for {username}");
            }
            info!(count = created.len(), "missing profiles created");
            println!("{} profile(s) created.", created.len());
        }
    }

    Ok(())
}
