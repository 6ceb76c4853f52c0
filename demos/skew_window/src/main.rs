use chrono::offset;
use gauthenticator::{uri_helper, Settings, Totp};

pub fn main() -> anyhow::Result<()> {
    // Initialize the TOTP with the defaults (SHA1 hash, 6-digits and 30 seconds period)
    let totp = Totp::new("3a5bde8d0e4eb6887cb81bc7d51c3cec22b00ad1")?;

    // Get seconds since Unix Epoch
    let now = offset::Local::now().timestamp() as u64;

    // The codes an authenticator app may show when its clock is one step off
    for offset in -1..=1 {
        let result = totp.compute_code(offset, now)?;
        println!("Step {offset:+}: {}", result.code);
    }
    println!("Remaining time: {}s", totp.remaining_seconds(now)?);

    // Where to point the user to enroll the secret
    let qr = uri_helper::build_enrollment_uri(
        &Settings::default(),
        "john.doe@email.com",
        b"3a5bde8d0e4eb6887cb81bc7d51c3cec22b00ad1",
    )?;
    println!("Enroll: {qr}");

    Ok(())
}
