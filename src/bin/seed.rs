use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher};
use sqlx::postgres::PgPoolOptions;

const DOCTORS: [(&str, &str, &str, &str); 5] = [
    (
        "Dr. John Smith",
        "john.smith@example.com",
        "Cardiology",
        "https://example.com/doctor1.jpg",
    ),
    (
        "Dr. Sarah Johnson",
        "sarah.johnson@example.com",
        "Dermatology",
        "https://example.com/doctor2.jpg",
    ),
    (
        "Dr. Michael Brown",
        "michael.brown@example.com",
        "Neurology",
        "https://example.com/doctor3.jpg",
    ),
    (
        "Dr. Emily Davis",
        "emily.davis@example.com",
        "Pediatrics",
        "https://example.com/doctor4.jpg",
    ),
    (
        "Dr. Robert Wilson",
        "robert.wilson@example.com",
        "Orthopedics",
        "https://example.com/doctor5.jpg",
    ),
];

const PATIENTS: [(&str, &str, &str); 3] = [
    (
        "Alice Johnson",
        "alice.johnson@example.com",
        "https://example.com/patient1.jpg",
    ),
    (
        "Bob Smith",
        "bob.smith@example.com",
        "https://example.com/patient2.jpg",
    ),
    (
        "Carol Davis",
        "carol.davis@example.com",
        "https://example.com/patient3.jpg",
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM app_user")
        .fetch_one(&pool)
        .await?;
    if existing > 0 {
        println!("Database already seeded");
        return Ok(());
    }

    // One shared demo password for every seeded account.
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(b"password123", &salt)
        .map_err(|e| anyhow::anyhow!("argon2 hash error: {e}"))?
        .to_string();

    for (name, email, specialization, photo_url) in DOCTORS {
        sqlx::query(
            r#"
            INSERT INTO app_user (name, email, password_hash, role, specialization, photo_url)
            VALUES ($1, $2, $3, 'DOCTOR', $4, $5)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(&password_hash)
        .bind(specialization)
        .bind(photo_url)
        .execute(&pool)
        .await?;
    }

    for (name, email, photo_url) in PATIENTS {
        sqlx::query(
            r#"
            INSERT INTO app_user (name, email, password_hash, role, photo_url)
            VALUES ($1, $2, $3, 'PATIENT', $4)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(&password_hash)
        .bind(photo_url)
        .execute(&pool)
        .await?;
    }

    println!(
        "Seeded {} doctors and {} patients",
        DOCTORS.len(),
        PATIENTS.len()
    );
    Ok(())
}
