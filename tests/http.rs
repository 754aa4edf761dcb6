use chrono::{Duration as Days, Local, NaiveDate};
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct Challenge {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct Day {
    calendar_date: NaiveDate,
    day_number: u32,
    status: String,
    is_retry: bool,
    attempt_number: u32,
}

#[derive(Debug, Deserialize)]
struct CalendarResponse {
    days: Vec<Day>,
}

#[derive(Debug, Deserialize)]
struct Achievement {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StatusChangeResponse {
    message: String,
    challenge_completed: bool,
    achievement: Option<Achievement>,
    days: Vec<Day>,
}

#[derive(Debug, Deserialize)]
struct UserAchievementsResponse {
    total_points: u64,
    achievements: Vec<Achievement>,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("challenge_calendar_http_{}_{}.json", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/challenges")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let data_path = unique_data_path();
    let child = Command::new(env!("CARGO_BIN_EXE_challenge_calendar"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn create_challenge(client: &Client, base_url: &str) -> Challenge {
    let response = client
        .post(format!("{base_url}/api/challenges"))
        .json(&json!({
            "title": "Silks starter",
            "training_days": [
                { "title": "Climbs", "total_exercises": 4 },
                { "title": "Foot locks", "total_exercises": 3 },
                { "title": "Rest", "is_rest_day": true }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn set_status(
    client: &Client,
    base_url: &str,
    user_id: Uuid,
    challenge_id: Uuid,
    date: NaiveDate,
    status: &str,
) -> StatusChangeResponse {
    let response = client
        .post(format!(
            "{base_url}/api/users/{user_id}/challenges/{challenge_id}/days/{date}/status"
        ))
        .json(&json!({ "status": status }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success(), "status change rejected");
    response.json().await.unwrap()
}

#[tokio::test]
async fn http_challenge_run_with_retry_awards_achievement() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let base_url = server.base_url.as_str();
    let client = Client::new();

    let challenge = create_challenge(&client, base_url).await;
    let response = client
        .post(format!("{base_url}/api/achievements"))
        .json(&json!({
            "name": "First challenge",
            "points": 40,
            "rule_type": "challenges_completed",
            "rule_value": 1,
            "challenge_id": challenge.id
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let user_id = Uuid::new_v4();
    let start = Local::now().date_naive() - Days::days(10);
    let joined: CalendarResponse = client
        .post(format!(
            "{base_url}/api/users/{user_id}/challenges/{}/join",
            challenge.id
        ))
        .json(&json!({ "start_date": start }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(joined.days.len(), 3);
    assert!(joined.days.iter().all(|day| day.status == "pending"));

    let access: Value = client
        .get(format!(
            "{base_url}/api/users/{user_id}/challenges/{}/days/{}/access",
            challenge.id,
            start + Days::days(1)
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(access["accessible"], json!(false));

    set_status(&client, base_url, user_id, challenge.id, start, "completed").await;
    let failed = set_status(
        &client,
        base_url,
        user_id,
        challenge.id,
        start + Days::days(1),
        "failed",
    )
    .await;
    assert!(failed.message.contains("retry scheduled"));
    let retry = failed
        .days
        .iter()
        .find(|day| day.is_retry)
        .expect("retry day");
    assert_eq!(retry.day_number, 2);
    assert_eq!(retry.attempt_number, 2);
    assert_eq!(retry.calendar_date, start + Days::days(3));

    let done = set_status(
        &client,
        base_url,
        user_id,
        challenge.id,
        start + Days::days(3),
        "completed",
    )
    .await;
    assert!(done.challenge_completed);
    assert_eq!(
        done.achievement.map(|a| a.name).as_deref(),
        Some("First challenge")
    );

    let mine: UserAchievementsResponse = client
        .get(format!("{base_url}/api/users/{user_id}/achievements"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.total_points, 40);
    assert_eq!(mine.achievements.len(), 1);

    let page = client
        .get(format!("{base_url}/users/{user_id}/challenges/{}", challenge.id))
        .send()
        .await
        .unwrap();
    assert!(page.status().is_success());
    assert!(page.text().await.unwrap().contains("Foot locks"));
}

#[tokio::test]
async fn http_errors_are_json_notifications() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let base_url = server.base_url.as_str();
    let client = Client::new();

    let response = client
        .post(format!("{base_url}/api/challenges"))
        .json(&json!({ "title": "Empty", "training_days": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let challenge = create_challenge(&client, base_url).await;
    let response = client
        .get(format!(
            "{base_url}/api/users/{}/challenges/{}/calendar",
            Uuid::new_v4(),
            challenge.id
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], json!("NOT_FOUND"));

    let user_id = Uuid::new_v4();
    let today = Local::now().date_naive();
    let join_url = format!(
        "{base_url}/api/users/{user_id}/challenges/{}/join",
        challenge.id
    );
    let first = client
        .post(&join_url)
        .json(&json!({ "start_date": today }))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let second = client
        .post(&join_url)
        .json(&json!({ "start_date": today }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let other_rule = client
        .post(format!("{base_url}/api/achievements"))
        .json(&json!({
            "name": "Figure collector",
            "points": 5,
            "rule_type": "figures_learned",
            "rule_value": 3,
            "challenge_id": challenge.id
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(other_rule.status(), StatusCode::BAD_REQUEST);
    let listed: Vec<Value> = client
        .get(format!("{base_url}/api/challenges/{}/achievements", challenge.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listed.is_empty());

    let locked = client
        .post(format!(
            "{base_url}/api/users/{user_id}/challenges/{}/days/{}/status",
            challenge.id,
            today + Days::days(1)
        ))
        .json(&json!({ "status": "completed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(locked.status(), StatusCode::CONFLICT);
    let body: Value = locked.json().await.unwrap();
    assert_eq!(body["code"], json!("PRECONDITION_FAILED"));
}

#[tokio::test]
async fn http_join_without_body_starts_today() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let base_url = server.base_url.as_str();
    let client = Client::new();

    let challenge = create_challenge(&client, base_url).await;
    let user_id = Uuid::new_v4();
    let response = client
        .post(format!(
            "{base_url}/api/users/{user_id}/challenges/{}/join",
            challenge.id
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let joined: CalendarResponse = response.json().await.unwrap();
    assert_eq!(joined.days[0].calendar_date, Local::now().date_naive());

    let malformed = client
        .post(format!(
            "{base_url}/api/users/{}/challenges/{}/join",
            Uuid::new_v4(),
            challenge.id
        ))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
}
