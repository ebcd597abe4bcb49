//! End-to-end tests driving the built fsized binary over a real socket.
//!
//! Each test runs the daemon in the foreground against a tempdir config,
//! talks to it like any client would, and stops it with SIGTERM.

use std::io::Read;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tempfile::TempDir;

struct DaemonUnderTest {
    child: Child,
    socket_path: PathBuf,
    monitored_path: PathBuf,
    _dir: TempDir,
}

impl DaemonUnderTest {
    /// Write a config into a tempdir, spawn the daemon, and wait for the
    /// socket node to appear.
    fn start(file_contents: Option<&[u8]>) -> Self {
        let dir = TempDir::new().unwrap();
        let monitored_path = dir.path().join("monitored.txt");
        if let Some(contents) = file_contents {
            std::fs::write(&monitored_path, contents).unwrap();
        }

        let socket_path = dir.path().join("fsized.sock");
        let config_path = write_config(dir.path(), &monitored_path, &socket_path);

        let child = spawn_daemon(&config_path, dir.path());
        wait_for_socket(&socket_path);

        Self {
            child,
            socket_path,
            monitored_path,
            _dir: dir,
        }
    }

    fn query(&self) -> String {
        read_reply(&self.socket_path)
    }

    /// SIGTERM the daemon and wait for it to exit.
    fn terminate(&mut self) -> ExitStatus {
        kill(Pid::from_raw(self.child.id() as i32), Signal::SIGTERM).unwrap();
        wait_for_exit(&mut self.child)
    }
}

impl Drop for DaemonUnderTest {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn write_config(dir: &Path, monitored: &Path, socket: &Path) -> PathBuf {
    let config_path = dir.join("fsized.toml");
    std::fs::write(
        &config_path,
        format!(
            "file_path = \"{}\"\nsocket_path = \"{}\"\n",
            monitored.display(),
            socket.display()
        ),
    )
    .unwrap();
    config_path
}

fn spawn_daemon(config_path: &Path, cwd: &Path) -> Child {
    Command::new(assert_cmd::cargo::cargo_bin("fsized"))
        .arg("-c")
        .arg(config_path)
        .current_dir(cwd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn fsized")
}

fn wait_for_socket(path: &Path) {
    use std::os::unix::fs::FileTypeExt;
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        // Wait for an actual socket node, not merely any existing path:
        // a stale leftover regular file may already sit at this path.
        if std::fs::symlink_metadata(path)
            .map(|m| m.file_type().is_socket())
            .unwrap_or(false)
        {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("socket {} never appeared", path.display());
}

fn wait_for_exit(child: &mut Child) -> ExitStatus {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    let _ = child.kill();
    panic!("daemon did not exit after SIGTERM");
}

fn read_reply(socket_path: &Path) -> String {
    let mut stream = UnixStream::connect(socket_path).expect("connect failed");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    let mut reply = String::new();
    stream.read_to_string(&mut reply).expect("read failed");
    reply
}

#[test]
fn reports_monitored_file_size() {
    let mut daemon = DaemonUnderTest::start(Some(b"0123456789"));

    assert_eq!(daemon.query(), "10\n");

    let status = daemon.terminate();
    assert!(status.success());
    assert!(!daemon.socket_path.exists(), "socket node not removed");
}

#[test]
fn size_is_current_at_request_time() {
    let mut daemon = DaemonUnderTest::start(Some(b"abc"));

    assert_eq!(daemon.query(), "3\n");

    std::fs::write(&daemon.monitored_path, b"abcdef").unwrap();
    assert_eq!(daemon.query(), "6\n");

    daemon.terminate();
}

#[test]
fn missing_file_gets_error_reply_and_daemon_survives() {
    let mut daemon = DaemonUnderTest::start(None);

    let reply = daemon.query();
    assert!(reply.starts_with("ERROR: "), "unexpected reply: {reply:?}");
    assert!(reply.ends_with('\n'));

    // Still serving after the failure
    let reply = daemon.query();
    assert!(reply.starts_with("ERROR: "));

    let status = daemon.terminate();
    assert!(status.success());
}

#[test]
fn concurrent_clients_each_get_a_response() {
    let mut daemon = DaemonUnderTest::start(Some(b"0123456789"));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let socket_path = daemon.socket_path.clone();
            std::thread::spawn(move || read_reply(&socket_path))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "10\n");
    }

    daemon.terminate();
}

#[test]
fn stale_socket_node_is_replaced_at_startup() {
    let dir = TempDir::new().unwrap();
    let monitored_path = dir.path().join("monitored.txt");
    std::fs::write(&monitored_path, b"abc").unwrap();

    let socket_path = dir.path().join("fsized.sock");
    // Leftover node from a crashed previous run
    std::fs::write(&socket_path, b"").unwrap();

    let config_path = write_config(dir.path(), &monitored_path, &socket_path);
    let mut child = spawn_daemon(&config_path, dir.path());
    wait_for_socket(&socket_path);

    assert_eq!(read_reply(&socket_path), "3\n");

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).unwrap();
    let status = wait_for_exit(&mut child);
    assert!(status.success());
}

#[test]
fn second_termination_signal_has_no_additional_effect() {
    let mut daemon = DaemonUnderTest::start(Some(b"x"));

    let pid = Pid::from_raw(daemon.child.id() as i32);
    kill(pid, Signal::SIGTERM).unwrap();
    // The process may already be gone by the second delivery; either way it
    // must still exit cleanly.
    let _ = kill(pid, Signal::SIGTERM);

    let status = wait_for_exit(&mut daemon.child);
    assert!(status.success());
    assert!(!daemon.socket_path.exists());
}

#[test]
fn sigint_also_stops_the_daemon() {
    let mut daemon = DaemonUnderTest::start(Some(b"x"));

    kill(Pid::from_raw(daemon.child.id() as i32), Signal::SIGINT).unwrap();
    let status = wait_for_exit(&mut daemon.child);
    assert!(status.success());
    assert!(!daemon.socket_path.exists());
}

#[test]
fn config_missing_socket_path_fails_startup() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("fsized.toml");
    std::fs::write(&config_path, "file_path = \"/var/log/syslog\"\n").unwrap();

    let mut child = spawn_daemon(&config_path, dir.path());
    let status = wait_for_exit(&mut child);

    assert!(!status.success());
    assert!(!dir.path().join("fsized.sock").exists());
}

#[test]
fn cli_client_round_trip() {
    let mut daemon = DaemonUnderTest::start(Some(b"hello world"));

    let output = Command::new(assert_cmd::cargo::cargo_bin("fsize"))
        .arg("--socket")
        .arg(&daemon.socket_path)
        .output()
        .expect("failed to run fsize");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "11\n");

    daemon.terminate();
}
