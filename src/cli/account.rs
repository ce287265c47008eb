use anyhow::Result;

use crate::{app::Dasho, storage::kv::KeyValueStore};

pub async fn sign_up<S: KeyValueStore + Clone>(
    app: &Dasho<S>,
    email: &str,
    password: &str,
    name: &str,
) -> Result<()> {
    let user = app.session.sign_up(email, password, name).await?;
    println!("Welcome, {}! Signed in as {}", user.greeting_name(), user.email);
    Ok(())
}

pub async fn sign_in<S: KeyValueStore + Clone>(
    app: &Dasho<S>,
    email: &str,
    password: &str,
) -> Result<()> {
    let user = app.session.sign_in(email, password).await?;
    println!("Welcome back, {}!", user.greeting_name());
    Ok(())
}

pub async fn sign_out<S: KeyValueStore + Clone>(app: &Dasho<S>) -> Result<()> {
    app.session.sign_out().await?;
    println!("Signed out");
    Ok(())
}

pub fn who_am_i<S: KeyValueStore + Clone>(app: &Dasho<S>) -> Result<()> {
    let user = app.session.require_user()?;
    println!(
        "{}\t{}\t{}",
        user.email,
        user.greeting_name(),
        user.created_at.format("%Y-%m-%d")
    );
    Ok(())
}
