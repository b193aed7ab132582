use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use super::analysis::to_s16;
use super::discord_ipc::encode_frame;
use super::metadata::relay_payload;
use super::relay::chunk_bytes;
use super::*;

#[test]
fn slot_versions_every_write() {
    let slot = Slot::new(1);
    assert_eq!(slot.version(), 0);
    assert!(slot.newer_than(0).is_none());

    slot.set(2);
    slot.set(3);
    let (v, value) = slot.newer_than(0).unwrap();
    assert_eq!((v, value), (2, 3));
    assert!(slot.newer_than(v).is_none());

    let reader = slot.clone();
    slot.set(4);
    assert_eq!(reader.get(), Some(4));
}

#[test]
fn stop_flag_interrupts_sleep() {
    let flag = StopFlag::default();
    assert!(flag.sleep(Duration::from_millis(1)));
    flag.stop();
    assert!(!flag.sleep(Duration::from_secs(10)));
}

#[test]
fn supervisor_starts_and_stops_workers() {
    let mut sup = Supervisor::new();
    assert_eq!(sup.status(WorkerKind::Relay), WorkerStatus::Idle);

    let (tx, rx) = mpsc::channel();
    sup.start(WorkerKind::Relay, move |ctx| {
        ctx.status.set(WorkerStatus::Running);
        let _ = tx.send(());
        while ctx.stop.sleep(Duration::from_millis(10)) {}
    });
    rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(sup.status(WorkerKind::Relay), WorkerStatus::Running);
    assert!(sup.is_running(WorkerKind::Relay));
    assert!(!sup.needs_restart(WorkerKind::Relay));

    sup.stop(WorkerKind::Relay);
    assert!(!sup.is_running(WorkerKind::Relay));
    assert_eq!(sup.status(WorkerKind::Relay), WorkerStatus::Idle);
}

#[test]
fn restarting_a_kind_replaces_the_old_thread() {
    let mut sup = Supervisor::new();
    let exits = Arc::new(AtomicUsize::new(0));
    for _ in 0..3 {
        let exits = exits.clone();
        sup.start(WorkerKind::Analysis, move |ctx| {
            while ctx.stop.sleep(Duration::from_millis(5)) {}
            exits.fetch_add(1, Ordering::SeqCst);
        });
    }
    assert_eq!(exits.load(Ordering::SeqCst), 2);
    sup.stop_all();
    assert_eq!(exits.load(Ordering::SeqCst), 3);
}

#[test]
fn failed_worker_needs_restart() {
    let mut sup = Supervisor::new();
    let (tx, rx) = mpsc::channel();
    sup.start(WorkerKind::Presence, move |ctx| {
        ctx.status.set(WorkerStatus::Failed);
        let _ = tx.send(());
    });
    rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(sup.status(WorkerKind::Presence), WorkerStatus::Failed);
    assert!(sup.needs_restart(WorkerKind::Presence));
    assert!(!sup.needs_restart(WorkerKind::Metadata));
}

#[test]
fn chunk_bytes_slices_little_endian_frames() {
    let pcm = [1i16, -1, 256, 2, 3, 4];
    let out = chunk_bytes(Some(&pcm), 1, 2, 2);
    assert_eq!(out, vec![0x00, 0x01, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00]);
}

#[test]
fn chunk_bytes_pads_with_silence() {
    let pcm = [7i16, 7];
    let out = chunk_bytes(Some(&pcm), 0, 3, 2);
    assert_eq!(out.len(), 12);
    assert_eq!(&out[..4], &[7, 0, 7, 0]);
    assert!(out[4..].iter().all(|b| *b == 0));

    assert_eq!(chunk_bytes(Some(&pcm), 50, 2, 2), vec![0; 8]);
    assert_eq!(chunk_bytes(None, 0, 2, 1), vec![0; 4]);
}

#[test]
fn to_s16_clamps_and_scales() {
    assert_eq!(to_s16(&[0.0, 1.0, -1.0, 2.0]), vec![0, i16::MAX, -i16::MAX, i16::MAX]);
}

#[test]
fn analysis_frame_lookup_follows_fps() {
    let a = Analysis {
        frames: vec![SpectralFrame::default(); 10],
        fps: 5,
        ..Analysis::default()
    };
    assert!(a.frame_at(0.0).is_some());
    assert!(a.frame_at(1.9).is_some());
    assert!(a.frame_at(2.0).is_none());
    assert!(a.frame_at(-1.0).is_none());
}

#[test]
fn frames_have_length_prefixed_header() {
    let frame = encode_frame(1, b"{}");
    assert_eq!(&frame[..4], &1u32.to_le_bytes());
    assert_eq!(&frame[4..8], &2u32.to_le_bytes());
    assert_eq!(&frame[8..], b"{}");
}

#[test]
fn activity_json_pads_and_truncates_fields() {
    let activity = Activity {
        details: "x".into(),
        state: "y".repeat(300),
        large_text: Some("Album".into()),
        large_image: None,
        started_at: Some(42),
    };
    let json = activity.to_json();
    assert_eq!(json["details"], "x ");
    assert_eq!(json["state"].as_str().unwrap().chars().count(), 128);
    assert_eq!(json["assets"]["large_text"], "Album");
    assert_eq!(json["timestamps"]["start"], 42);
}

fn info() -> TrackInfo {
    TrackInfo {
        id: 7,
        title: "Song".into(),
        artist: Some("Band".into()),
        album: None,
        path: PathBuf::from("/music/song.flac"),
        duration: 180.0,
    }
}

#[test]
fn relay_payload_carries_track_fields() {
    let v: serde_json::Value = serde_json::from_str(&relay_payload(&info())).unwrap();
    assert_eq!(v["id"], 7);
    assert_eq!(v["title"], "Song");
    assert_eq!(v["artist"], "Band");
    assert!(v["album"].is_null());
}

#[test]
fn metadata_worker_publishes_presence_activity() {
    let mut sup = Supervisor::new();
    let jobs = Slot::new(MetadataJob::default());
    let presence: Slot<Option<Activity>> = Slot::new(None);
    let dir = tempfile::tempdir().unwrap();
    let sinks = MetadataSinks {
        mpris: None,
        presence: presence.clone(),
        stream: crate::config::StreamSettings::default(),
        art_dir: dir.path().to_path_buf(),
    };
    let worker_jobs = jobs.clone();
    sup.start(WorkerKind::Metadata, move |ctx| run_metadata(ctx, worker_jobs, sinks));

    jobs.set(MetadataJob {
        track: Some(info()),
        presence: true,
        relay: false,
    });
    let mut activity = None;
    for _ in 0..100 {
        if let Some(Some(a)) = presence.get() {
            activity = Some(a);
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    sup.stop_all();

    let activity = activity.expect("activity published");
    assert_eq!(activity.details, "Song");
    assert_eq!(activity.state, "Band");
}

#[cfg(unix)]
mod ipc {
    use std::io::{Read, Write};
    use std::os::unix::net::UnixStream;

    use serde_json::{Value, json};

    use super::super::discord_ipc::encode_frame;
    use super::super::{Activity, DiscordIpc};

    fn read_frame(s: &mut UnixStream) -> (u32, Value) {
        let mut header = [0u8; 8];
        s.read_exact(&mut header).unwrap();
        let op = u32::from_le_bytes(header[..4].try_into().unwrap());
        let len = u32::from_le_bytes(header[4..].try_into().unwrap());
        let mut body = vec![0u8; len as usize];
        s.read_exact(&mut body).unwrap();
        (op, serde_json::from_slice(&body).unwrap())
    }

    fn write_frame(s: &mut UnixStream, op: u32, v: Value) {
        s.write_all(&encode_frame(op, v.to_string().as_bytes())).unwrap();
    }

    #[test]
    fn handshake_then_set_activity() {
        let (client, mut server) = UnixStream::pair().unwrap();
        let peer = std::thread::spawn(move || {
            let (op, hello) = read_frame(&mut server);
            assert_eq!(op, 0);
            assert_eq!(hello["client_id"], "123");
            write_frame(&mut server, 1, json!({ "evt": "READY" }));

            let (op, cmd) = read_frame(&mut server);
            assert_eq!(op, 1);
            assert_eq!(cmd["cmd"], "SET_ACTIVITY");
            assert_eq!(cmd["args"]["activity"]["details"], "Song");
            write_frame(&mut server, 1, json!({ "cmd": "SET_ACTIVITY", "nonce": cmd["nonce"] }));
        });

        let mut ipc = DiscordIpc::handshake(client, "123").unwrap();
        let activity = Activity {
            details: "Song".into(),
            state: "Band".into(),
            ..Activity::default()
        };
        ipc.set_activity(Some(&activity)).unwrap();
        peer.join().unwrap();
    }

    #[test]
    fn rejected_handshake_is_an_error() {
        let (client, mut server) = UnixStream::pair().unwrap();
        let peer = std::thread::spawn(move || {
            let _ = read_frame(&mut server);
            write_frame(&mut server, 2, json!({ "code": 4000, "message": "bad client" }));
        });
        let err = DiscordIpc::handshake(client, "0").err().unwrap();
        assert!(err.to_string().contains("bad client"));
        peer.join().unwrap();
    }
}

#[cfg(unix)]
mod relay {
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Instant;

    use super::*;
    use crate::config::StreamSettings;

    fn start(sup: &mut Supervisor, cursor: &Slot<StreamCursor>, cache: &AnalysisCache, cfg: StreamSettings) {
        let (cursor, cache) = (cursor.clone(), cache.clone());
        sup.start(WorkerKind::Relay, move |ctx| run_relay(ctx, cursor, cache, cfg));
    }

    fn wait_for(what: &str, mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() {
            assert!(Instant::now() < deadline, "timed out waiting for {what}");
            thread::sleep(Duration::from_millis(10));
        }
    }

    fn samples(path: &Path) -> Vec<i16> {
        fs::read(path)
            .unwrap_or_default()
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect()
    }

    #[test]
    fn stop_returns_while_the_encoder_is_stalled() {
        let mut sup = Supervisor::new();
        let cursor = Slot::new(StreamCursor::default());
        let cache: AnalysisCache = Arc::new(Mutex::new(HashMap::new()));
        // One second of 44.1 kHz stereo is bigger than a pipe buffer, and
        // `sleep` never reads it.
        let cfg = StreamSettings {
            encoder: "sleep".into(),
            encoder_args: vec!["30".into()],
            chunk_ms: 1000,
            ..StreamSettings::default()
        };
        start(&mut sup, &cursor, &cache, cfg);
        wait_for("relay start", || sup.status(WorkerKind::Relay) == WorkerStatus::Running);
        thread::sleep(Duration::from_millis(200));

        let began = Instant::now();
        sup.stop(WorkerKind::Relay);
        assert!(began.elapsed() < Duration::from_secs(3), "stop took {:?}", began.elapsed());
        assert!(!sup.is_running(WorkerKind::Relay));
    }

    #[test]
    fn pauses_write_silence_and_seeks_move_the_read_position() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stream.raw");
        let cache: AnalysisCache = Arc::new(Mutex::new(HashMap::new()));
        let pcm: Vec<i16> = (0..2000).collect();
        cache.lock().unwrap().insert(
            1,
            Arc::new(Analysis {
                pcm,
                sample_rate: 1000,
                channels: 1,
                ..Analysis::default()
            }),
        );
        let cursor = Slot::new(StreamCursor {
            generation: 1,
            track: Some(1),
            position: 0.0,
            paused: true,
        });
        let cfg = StreamSettings {
            encoder: "sh".into(),
            encoder_args: vec!["-c".into(), format!("cat > '{}'", out.display())],
            sample_rate: 1000,
            channels: 1,
            chunk_ms: 10,
            ..StreamSettings::default()
        };

        let mut sup = Supervisor::new();
        start(&mut sup, &cursor, &cache, cfg);
        wait_for("paused chunks", || samples(&out).len() >= 50);
        assert!(samples(&out).iter().all(|&s| s == 0));

        cursor.set(StreamCursor {
            generation: 2,
            track: Some(1),
            position: 0.5,
            paused: false,
        });
        wait_for("audio after the seek", || {
            let s = samples(&out);
            s.iter().position(|&v| v != 0).is_some_and(|k| s.len() >= k + 3)
        });
        sup.stop(WorkerKind::Relay);

        let s = samples(&out);
        let k = s.iter().position(|&v| v != 0).unwrap();
        assert!(k >= 50);
        assert_eq!(&s[k..k + 3], &[500, 501, 502]);
    }
}
