use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use wardwire_core::{KeyStore, Role, Session, SessionId, SessionKey, SessionManager};
use wardwire_score::{
    corrupt, generate_secret, ChallengeRecord, RecallOracle, ScorerConfig, SessionHistory,
    NORMAL_RETENTION, SECRET_LEN, TAMPER_RETENTION,
};
use wardwire_server::run_server;
use wardwire_transport::{
    ChannelEvent, MemoryBus, MessageBus, SecureChannel, TopicPair, AUTH_FAILURE_MARKER,
};

const DEFAULT_KEY_DIR: &str = "_session_keys";
const DEFAULT_MESSAGE: &str = "AUTH_REQUEST";
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Per-symbol recall of the simulated reconstruction oracle. High but not
/// perfect, like a well-trained model.
const DEFAULT_RECALL: f64 = 0.98;

fn usage() {
    eprintln!("usage: wardwire <command> [options]");
    eprintln!();
    eprintln!("commands:");
    eprintln!("  keygen    [--key-dir DIR]");
    eprintln!("            create and persist a new session id + key");
    eprintln!("  simulate  [--sessions N] [--tamper] [--retention R] [--recall R] [--seed S]");
    eprintln!("            run scored challenge sessions and print the verdicts");
    eprintln!("  exchange  [--message TEXT] [--key-dir DIR] [--corrupt] [--kill]");
    eprintln!("            run an encrypted exchange against an in-process server");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        usage();
        return Ok(());
    };

    match command.as_str() {
        "keygen" => keygen(&args[2..]),
        "simulate" => simulate(&args[2..]),
        "exchange" => exchange(&args[2..]).await,
        _ => {
            usage();
            Ok(())
        }
    }
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

fn keygen(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let dir = flag_value(args, "--key-dir").unwrap_or(DEFAULT_KEY_DIR);
    let manager = SessionManager::new(KeyStore::open(dir)?);
    let session = manager.create()?;

    println!("New session: {}", session.id());
    println!("Key:         {}", session.key().to_hex());
    println!(
        "Saved to:    {}",
        manager.store().path_for(&session.id()).display()
    );
    Ok(())
}

fn simulate(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let sessions: usize = flag_value(args, "--sessions")
        .map(str::parse)
        .transpose()?
        .unwrap_or(5);
    let tamper = has_flag(args, "--tamper");
    let retention: f64 = match flag_value(args, "--retention") {
        Some(v) => v.parse()?,
        None if tamper => TAMPER_RETENTION,
        None => NORMAL_RETENTION,
    };
    let recall: f64 = flag_value(args, "--recall")
        .map(str::parse)
        .transpose()?
        .unwrap_or(DEFAULT_RECALL);
    let seed: u64 = match flag_value(args, "--seed") {
        Some(v) => v.parse()?,
        None => rand::rngs::OsRng.next_u64(),
    };

    let config = ScorerConfig::default();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut history = SessionHistory::new();

    println!(
        "{} session(s), retention {:.2}, recall {:.2}, seed {}",
        sessions, retention, recall, seed
    );
    println!();

    for n in 0..sessions {
        let session_id = SessionId::generate();
        let secret = generate_secret(&mut rng, SECRET_LEN);
        let noisy = corrupt(&secret, retention, &mut rng)?;
        let oracle = RecallOracle::new(secret.clone(), recall, seed.wrapping_add(n as u64));
        let record = ChallengeRecord::evaluate(&secret, &noisy, &oracle, &config)?;

        println!("session {}", session_id);
        println!("  secret        {}", record.secret());
        println!("  noisy         {}", record.noisy());
        println!("  reconstructed {}", record.reconstructed());
        println!(
            "  entropy {:.3}  drift {:.1}%  anomaly {:.3}  threat {}  auth {}",
            record.entropy(),
            record.drift() * 100.0,
            record.anomaly(),
            record.threat(),
            if record.auth_success() { "PASS" } else { "FAIL" },
        );
        history.push(session_id.to_string(), record);
    }

    let summary = history.summary();
    println!();
    println!(
        "summary: {}/{} auth passed, {} suspicious, {} tampered",
        summary.auth_successes, summary.sessions, summary.suspicious, summary.tampered
    );
    println!(
        "means:   entropy {:.3}, drift {:.1}%, anomaly {:.3}",
        summary.mean_entropy,
        summary.mean_drift * 100.0,
        summary.mean_anomaly
    );
    Ok(())
}

async fn exchange(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let dir = flag_value(args, "--key-dir").unwrap_or(DEFAULT_KEY_DIR);
    let message = flag_value(args, "--message").unwrap_or(DEFAULT_MESSAGE);
    let corrupt_reply = has_flag(args, "--corrupt");
    let kill = has_flag(args, "--kill");

    let bus = Arc::new(MemoryBus::new());

    // In-process responder over the same key directory.
    let service_manager = SessionManager::new(KeyStore::open(dir)?);
    let service_bus = Arc::clone(&bus) as Arc<dyn MessageBus>;
    let service = tokio::spawn(async move {
        let _ = run_server(service_bus, service_manager, TopicPair::server()).await;
    });
    // Give the service time to subscribe before the first frame goes out.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let manager = SessionManager::new(KeyStore::open(dir)?);
    let session = manager.create()?;
    let session_id = session.id();
    let key_copy = SessionKey::from_bytes(*session.key().as_bytes());
    println!("Session: {}", session_id);

    let mut client = SecureChannel::open(
        Arc::clone(&bus) as Arc<dyn MessageBus>,
        session,
        TopicPair::client(),
    )
    .await?;

    client.send_text(message).await?;
    println!("You:    {}", message);
    match tokio::time::timeout(RECV_TIMEOUT, client.recv()).await {
        Ok(Ok(ChannelEvent::Message(reply))) => println!("Server: {}", reply),
        Ok(Ok(other)) => println!("Server: unexpected event {:?}", other),
        Ok(Err(e)) => eprintln!("Receive failed: {}", e),
        Err(_) => eprintln!("No reply within {:?}", RECV_TIMEOUT),
    }

    if corrupt_reply {
        // Simulated tamper: a bit-flipped frame for this session lands on
        // the reply topic. The channel must surface the failure marker and
        // stay alive.
        let mut twin = Session::new(session_id, key_copy, Role::Initiator);
        let mut wire = twin.seal_message("tampered reply")?.to_wire();
        *wire.last_mut().ok_or("empty frame")? ^= 0x01;
        bus.publish("wardwire/client", wire).await?;

        match tokio::time::timeout(RECV_TIMEOUT, client.recv()).await {
            Ok(Ok(ChannelEvent::AuthFailure)) => println!("Server: {}", AUTH_FAILURE_MARKER),
            Ok(Ok(other)) => println!("Server: unexpected event {:?}", other),
            Ok(Err(e)) => eprintln!("Receive failed: {}", e),
            Err(_) => eprintln!("No reply within {:?}", RECV_TIMEOUT),
        }
        println!("Session still active: {}", client.is_active());
    }

    if kill {
        client.send_kill().await?;
        println!("Kill signal sent; session terminated.");
        match client.send_text("after kill").await {
            Err(e) => println!("Further sends fail: {}", e),
            Ok(()) => println!("unexpected: send succeeded after kill"),
        }
    }

    service.abort();
    Ok(())
}
