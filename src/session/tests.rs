use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::*;
use crate::catalog::{Catalog, TOTAL_KEY, Track};
use crate::config::{QueueLoopSetting, Settings};
use crate::engine::fake::FakeEngine;

const TITLES: [&str; 4] = ["A", "B", "C", "D"];

fn path_of(title: &str) -> String {
    format!("/music/{}.flac", title.to_lowercase())
}

fn catalog() -> Catalog {
    let tracks = TITLES
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let mut track = Track::new(i as u32, *t, path_of(t));
            track.meta.duration = Some(200.0);
            track
        })
        .collect();
    Catalog::from_tracks(tracks)
}

fn engine() -> FakeEngine {
    let paths: Vec<String> = TITLES.iter().map(|t| path_of(t)).collect();
    FakeEngine::with_files(paths.iter().map(|p| (p.as_str(), 200.0)))
}

fn build(settings: &Settings, catalog: Catalog, engine: FakeEngine, ids: Vec<u32>) -> Session<FakeEngine> {
    let mut s = Session::with_rng(catalog, ids, engine, settings, StdRng::seed_from_u64(3));
    s.resize(10, 5);
    s.start();
    s
}

/// Session over A, B, C with default settings, playing A.
fn session() -> Session<FakeEngine> {
    build(&Settings::default(), catalog(), engine(), vec![0, 1, 2])
}

fn loaded(s: &Session<FakeEngine>) -> Option<PathBuf> {
    s.engine().loaded.clone()
}

fn end_track(s: &mut Session<FakeEngine>) {
    s.engine_mut().position = 200.0;
    s.tick();
}

fn select(s: &mut Session<FakeEngine>, pos: usize) {
    s.apply(Action::Top);
    for _ in 0..pos {
        s.apply(Action::CursorDown);
    }
    assert_eq!(s.queue().cursor(), pos);
}

#[test]
fn start_plays_the_head_of_the_queue() {
    let mut s = session();
    assert_eq!(s.state(), PlaybackState::Playing);
    assert_eq!(loaded(&s), Some(PathBuf::from(path_of("A"))));
    assert!(s.engine().playing);
    let effects = s.take_effects();
    assert!(effects.contains(&Effect::TrackChanged(0)));
    assert!(effects.contains(&Effect::PlaybackChanged(PlaybackState::Playing)));
}

#[test]
fn deleting_the_playing_head_plays_the_next_track() {
    let mut s = session();
    assert_eq!(s.queue().cursor(), 0);

    s.apply(Action::DeleteSelected);

    assert_eq!(s.queue().items(), &[1, 2]);
    assert_eq!(s.queue().current(), 0);
    assert_eq!(s.last_transition(), Some(Transition::Delete));
    assert_eq!(loaded(&s), Some(PathBuf::from(path_of("B"))));
    assert_eq!(s.state(), PlaybackState::Playing);
}

#[test]
fn delete_keeps_both_indices_valid() {
    for len in 1..=4usize {
        for current in 0..len {
            for cursor in 0..len {
                let ids: Vec<u32> = (0..len as u32).collect();
                let mut s = build(&Settings::default(), catalog(), engine(), ids);
                s.jump_to(current);
                select(&mut s, cursor);

                s.apply(Action::DeleteSelected);

                let q = s.queue();
                assert_eq!(q.len(), len - 1);
                if q.is_empty() {
                    assert!(s.is_finished());
                } else {
                    assert!(q.current() < q.len(), "len={len} current={current} cursor={cursor}");
                    assert!(q.cursor() < q.len(), "len={len} current={current} cursor={cursor}");
                }
            }
        }
    }
}

#[test]
fn deleting_another_entry_keeps_the_playing_track() {
    let mut s = session();
    s.jump_to(2);
    select(&mut s, 0);
    s.take_effects();

    s.apply(Action::DeleteSelected);

    assert_eq!(s.queue().items(), &[1, 2]);
    assert_eq!(s.queue().current(), 1);
    assert_eq!(s.queue().current_id(), Some(2));
    assert_eq!(s.take_effects(), vec![Effect::QueueChanged]);
}

#[test]
fn deleting_the_playing_tail_applies_the_loop_policy() {
    let mut s = session();
    s.jump_to(2);
    select(&mut s, 2);
    s.apply(Action::DeleteSelected);
    assert!(s.is_finished());

    let settings = Settings {
        playback: crate::config::PlaybackSettings {
            queue_loop: QueueLoopSetting::Repeat,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut s = build(&settings, catalog(), engine(), vec![0, 1, 2]);
    s.jump_to(2);
    select(&mut s, 2);
    s.apply(Action::DeleteSelected);
    assert!(!s.is_finished());
    assert_eq!(s.queue().current(), 0);
    assert_eq!(loaded(&s), Some(PathBuf::from(path_of("A"))));
}

#[test]
fn insert_then_delete_restores_the_queue() {
    for pos in 0..=3 {
        let mut q = Queue::new(vec![0, 1, 2], vec![0, 1, 2]);
        q.resize(10);
        q.set_current(1);
        q.insert(pos, 9);
        q.delete(pos);
        assert_eq!(q.items(), &[0, 1, 2]);
        assert_eq!(q.origin(), &[0, 1, 2]);
        assert_eq!(q.current(), 1);
    }
}

#[test]
fn moving_entries_keeps_the_playing_track() {
    let mut s = session();
    s.jump_to(1);
    select(&mut s, 1);

    s.apply(Action::MoveUp);
    assert_eq!(s.queue().items(), &[1, 0, 2]);
    assert_eq!(s.queue().current(), 0);
    assert_eq!(s.queue().cursor(), 0);

    s.apply(Action::MoveDown);
    s.apply(Action::MoveDown);
    assert_eq!(s.queue().items(), &[0, 2, 1]);
    assert_eq!(s.queue().current_id(), Some(1));
    assert_eq!(s.queue().cursor(), 2);

    // Already at the bottom.
    s.apply(Action::MoveDown);
    assert_eq!(s.queue().items(), &[0, 2, 1]);
}

#[test]
fn volume_steps_and_mute_restore() {
    let mut s = session();
    assert_eq!(s.volume(), 50);
    for _ in 0..5 {
        s.apply(Action::VolumeUp);
    }
    assert_eq!(s.volume(), 55);

    s.apply(Action::ToggleMute);
    assert_eq!(s.volume(), 0);
    assert_eq!(s.saved_volume(), Some(55));
    assert_eq!(s.engine().volume, 0.0);

    s.apply(Action::ToggleMute);
    assert_eq!(s.volume(), 55);
    assert_eq!(s.saved_volume(), None);
}

#[test]
fn mute_survives_unrelated_events() {
    let mut s = session();
    s.apply(Action::SetVolume(70));
    s.apply(Action::ToggleMute);
    s.apply(Action::Next);
    s.apply(Action::CycleRepeat);
    s.apply(Action::TogglePause);
    s.apply(Action::CursorDown);
    s.apply(Action::ToggleMute);
    assert_eq!(s.volume(), 70);
}

#[test]
fn volume_change_while_muted_unmutes_first() {
    let mut s = session();
    s.apply(Action::ToggleMute);
    s.apply(Action::VolumeDown);
    assert_eq!(s.volume(), 49);
    assert!(!s.is_muted());
}

#[test]
fn volume_is_clamped() {
    let mut s = session();
    s.apply(Action::SetVolume(99));
    s.apply(Action::VolumeUp);
    s.apply(Action::VolumeUp);
    assert_eq!(s.volume(), 100);
    s.apply(Action::SetVolume(0));
    s.apply(Action::VolumeDown);
    assert_eq!(s.volume(), 0);
}

fn clip_session() -> Session<FakeEngine> {
    let mut cat = catalog();
    if let Some(t) = cat.get_mut(0) {
        t.set_clip("chorus", 10.0, 40.0).unwrap();
    }
    let settings = Settings {
        playback: crate::config::PlaybackSettings {
            clip_mode: true,
            ..Default::default()
        },
        ..Default::default()
    };
    build(&settings, cat, engine(), vec![0, 1, 2])
}

#[test]
fn clip_end_triggers_track_ended() {
    let mut s = clip_session();
    assert_eq!(s.engine().position, 10.0);
    assert_eq!(s.position(), 0.0);
    assert_eq!(s.display_duration(), 30.0);

    s.engine_mut().position = 39.5;
    s.tick();
    assert_eq!(s.last_transition(), None);
    assert_eq!(loaded(&s), Some(PathBuf::from(path_of("A"))));
    assert!((s.position() - 29.5).abs() < 1e-9);

    s.engine_mut().position = 40.1;
    s.tick();
    assert_eq!(s.last_transition(), Some(Transition::TrackEnded));
    assert_eq!(loaded(&s), Some(PathBuf::from(path_of("B"))));
}

#[test]
fn clip_position_never_exceeds_clip_length() {
    let mut s = clip_session();
    s.engine_mut().position = 45.0;
    assert_eq!(s.position(), 30.0);
    s.engine_mut().position = 3.0;
    assert_eq!(s.position(), 0.0);
}

#[test]
fn clip_fades_in_over_two_seconds() {
    let mut s = clip_session();
    s.engine_mut().position = 11.0;
    s.tick();
    assert!((s.engine().volume - 0.25).abs() < 1e-6);
    s.engine_mut().position = 15.0;
    s.tick();
    assert!((s.engine().volume - 0.5).abs() < 1e-6);
}

#[test]
fn entering_clip_mode_outside_the_clip_seeks_to_its_start() {
    let mut cat = catalog();
    if let Some(t) = cat.get_mut(0) {
        t.set_clip("chorus", 10.0, 40.0).unwrap();
    }
    let mut s = build(&Settings::default(), cat, engine(), vec![0, 1]);
    s.engine_mut().position = 100.0;
    assert_eq!(s.display_duration(), 200.0);

    s.apply(Action::ToggleClipMode);

    assert!(s.clip_mode());
    assert_eq!(s.engine().position, 10.0);
    assert_eq!(s.display_duration(), 30.0);
}

#[test]
fn seeks_are_clamped_and_bump_the_generation() {
    let mut s = session();
    let g = s.generation();
    s.engine_mut().position = 5.0;
    s.apply(Action::SeekBy(-100.0));
    assert_eq!(s.engine().position, 0.0);
    s.apply(Action::SeekBy(1000.0));
    assert_eq!(s.engine().position, 200.0);
    assert!(s.generation() >= g + 2);

    let mut s = clip_session();
    s.apply(Action::SeekTo(-5.0));
    assert_eq!(s.engine().position, 10.0);
    s.apply(Action::SeekTo(100.0));
    assert_eq!(s.engine().position, 40.0);
    assert!(s.take_effects().contains(&Effect::Seeked(30.0)));
}

#[test]
fn natural_end_advances_then_finishes() {
    let mut s = session();
    end_track(&mut s);
    assert_eq!(s.queue().current(), 1);
    end_track(&mut s);
    end_track(&mut s);
    assert!(s.is_finished());
    assert_eq!(s.state(), PlaybackState::Stopped);
    assert!(s.take_effects().contains(&Effect::Finished));
}

#[test]
fn engine_running_dry_counts_as_the_end() {
    let mut s = session();
    s.engine_mut().active = false;
    s.tick();
    assert_eq!(s.last_transition(), Some(Transition::TrackEnded));
    assert_eq!(s.queue().current(), 1);
}

#[test]
fn repeat_infinite_replays_the_same_track() {
    let mut s = session();
    s.apply(Action::CycleRepeat);
    s.apply(Action::CycleRepeat);
    assert_eq!(s.repeat(), RepeatMode::Infinite);
    for _ in 0..3 {
        end_track(&mut s);
    }
    assert_eq!(s.queue().current(), 0);
    assert_eq!(s.engine().loads.len(), 4);
}

#[test]
fn repeat_once_replays_a_single_time() {
    let mut s = session();
    s.apply(Action::CycleRepeat);
    end_track(&mut s);
    assert_eq!(s.queue().current(), 0);
    assert_eq!(s.repeat(), RepeatMode::None);
    end_track(&mut s);
    assert_eq!(s.queue().current(), 1);
}

#[test]
fn repeat_queue_wraps_at_the_tail() {
    let settings = Settings {
        playback: crate::config::PlaybackSettings {
            queue_loop: QueueLoopSetting::Repeat,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut s = build(&settings, catalog(), engine(), vec![0, 1]);
    end_track(&mut s);
    end_track(&mut s);
    assert!(!s.is_finished());
    assert_eq!(s.queue().current(), 0);
}

#[test]
fn reshuffle_starts_a_new_lap_of_the_whole_queue() {
    let settings = Settings {
        playback: crate::config::PlaybackSettings {
            queue_loop: QueueLoopSetting::Reshuffle,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut s = build(&settings, catalog(), engine(), vec![0, 1, 2, 3]);
    for _ in 0..4 {
        end_track(&mut s);
    }
    assert!(!s.is_finished());
    assert_eq!(s.queue().current(), 0);
    let mut lap = s.queue().items().to_vec();
    lap.sort_unstable();
    assert_eq!(lap, vec![0, 1, 2, 3]);
}

#[test]
fn ending_applies_at_the_next_natural_end() {
    let mut s = session();
    s.apply(Action::ToggleEnding);
    s.apply(Action::Next);
    assert!(!s.is_finished());
    end_track(&mut s);
    assert!(s.is_finished());
}

#[test]
fn restart_defers_the_end_request_one_cycle() {
    let mut s = session();
    s.apply(Action::ToggleEnding);
    s.engine_mut().position = 50.0;
    s.apply(Action::Restart);
    assert_eq!(s.engine().position, 0.0);

    end_track(&mut s);
    assert!(!s.is_finished());
    assert_eq!(s.queue().current(), 1);

    end_track(&mut s);
    assert!(s.is_finished());
}

#[test]
fn next_at_the_tail_without_looping_keeps_playing() {
    let mut s = session();
    s.jump_to(2);
    s.apply(Action::Next);
    assert_eq!(s.queue().current(), 2);
    assert_eq!(s.state(), PlaybackState::Playing);
    assert_eq!(s.message(), Some("end of queue"));
}

#[test]
fn prev_steps_back_and_restarts_at_the_head() {
    let mut s = session();
    s.apply(Action::Next);
    s.apply(Action::Prev);
    assert_eq!(s.queue().current(), 0);
    assert_eq!(s.last_transition(), Some(Transition::Back));

    s.engine_mut().position = 30.0;
    s.apply(Action::Prev);
    assert_eq!(s.engine().position, 0.0);
    assert_eq!(s.last_transition(), Some(Transition::Restart));
}

#[test]
fn missing_files_are_skipped_and_recorded() {
    let mut e = engine();
    e.files.remove(&PathBuf::from(path_of("B")));
    let mut s = build(&Settings::default(), catalog(), e, vec![0, 1, 2]);

    end_track(&mut s);

    assert_eq!(s.queue().current(), 2);
    assert_eq!(loaded(&s), Some(PathBuf::from(path_of("C"))));
    assert_eq!(s.missing(), &[PathBuf::from(path_of("B"))]);
}

#[test]
fn nothing_playable_finishes_the_session() {
    let s = build(
        &Settings::default(),
        catalog(),
        FakeEngine::default(),
        vec![0, 1],
    );
    assert!(s.is_finished());
    assert_eq!(s.missing().len(), 2);
}

#[test]
fn pause_and_resume() {
    let mut s = session();
    s.take_effects();
    s.apply(Action::TogglePause);
    assert_eq!(s.state(), PlaybackState::Paused);
    assert!(!s.engine().playing);

    // A paused track never ends on its own.
    s.engine_mut().position = 200.0;
    s.tick();
    assert_eq!(s.queue().current(), 0);

    s.apply(Action::Play);
    assert_eq!(s.state(), PlaybackState::Playing);
    assert_eq!(
        s.take_effects(),
        vec![
            Effect::PlaybackChanged(PlaybackState::Paused),
            Effect::PlaybackChanged(PlaybackState::Playing),
        ]
    );
}

#[test]
fn stop_pauses_at_the_start() {
    let mut s = session();
    s.engine_mut().position = 80.0;
    s.apply(Action::Stop);
    assert_eq!(s.state(), PlaybackState::Paused);
    assert_eq!(s.engine().position, 0.0);
}

#[test]
fn listening_time_is_credited_on_skip() {
    let mut s = session();
    thread::sleep(Duration::from_millis(20));
    s.apply(Action::Next);
    let track = s.catalog().get(0).unwrap();
    let total = track.listen_times.get(TOTAL_KEY).copied().unwrap_or(0.0);
    assert!(total > 0.0);
    assert_eq!(track.listen_times.len(), 2);
}

#[test]
fn quit_finishes_and_stops_the_engine() {
    let mut s = session();
    s.apply(Action::Quit);
    assert!(s.is_finished());
    assert_eq!(s.last_transition(), Some(Transition::End));
    assert!(s.engine().loaded.is_none());
    assert!(!s.apply(Action::Next));
}

#[test]
fn insert_prompt_queues_after_the_cursor() {
    let mut s = session();
    s.apply(Action::OpenPrompt(PromptKind::Insert));
    for c in "d".chars() {
        s.apply(Action::Prompt(PromptEdit::Char(c)));
    }
    s.apply(Action::Prompt(PromptEdit::Submit));

    assert!(s.prompt().is_none());
    assert_eq!(s.queue().items(), &[0, 3, 1, 2]);
    assert_eq!(s.queue().current(), 0);
}

#[test]
fn failed_lookup_keeps_the_prompt_open() {
    let mut s = session();
    s.apply(Action::OpenPrompt(PromptKind::Append));
    for c in "zzz".chars() {
        s.apply(Action::Prompt(PromptEdit::Char(c)));
    }
    s.apply(Action::Prompt(PromptEdit::Submit));
    assert_eq!(s.prompt().map(Prompt::buffer), Some("zzz"));
    assert!(s.message().is_some());
    assert_eq!(s.queue().len(), 3);

    s.apply(Action::Prompt(PromptEdit::Cancel));
    assert!(s.prompt().is_none());
}

#[test]
fn append_prompt_accepts_ids() {
    let mut s = session();
    s.apply(Action::OpenPrompt(PromptKind::Append));
    s.apply(Action::Prompt(PromptEdit::Char('3')));
    s.apply(Action::Prompt(PromptEdit::Submit));
    assert_eq!(s.queue().items(), &[0, 1, 2, 3]);
}

#[test]
fn tag_prompt_tags_every_queued_track() {
    let mut s = session();
    s.apply(Action::OpenPrompt(PromptKind::Tag));
    for c in "fav, live,".chars() {
        s.apply(Action::Prompt(PromptEdit::Char(c)));
    }
    s.apply(Action::Prompt(PromptEdit::Submit));

    for id in 0..3 {
        let tags = &s.catalog().get(id).unwrap().tags;
        assert!(tags.contains("fav") && tags.contains("live"));
        assert_eq!(tags.len(), 2);
    }
    assert!(s.catalog().get(3).unwrap().tags.is_empty());
}

#[test]
fn find_prompt_moves_the_cursor() {
    let mut s = session();
    s.apply(Action::OpenPrompt(PromptKind::Find));
    s.apply(Action::Prompt(PromptEdit::Char('c')));
    s.apply(Action::Prompt(PromptEdit::Submit));
    assert_eq!(s.queue().cursor(), 2);
    assert_eq!(s.queue().current(), 0);
}

#[test]
fn lyric_enter_seeks_to_the_tagged_line() {
    let mut cat = catalog();
    if let Some(t) = cat.get_mut(0) {
        t.raw_lyrics = Some("[00:10.00]one\n[00:20.00]two\n[00:30.00]three".into());
    }
    let settings = Settings {
        features: crate::config::FeatureSettings {
            lyrics: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut s = build(&settings, cat, engine(), vec![0, 1]);

    s.apply(Action::SwitchFocus);
    assert_eq!(s.focus(), Focus::Lyrics);
    s.apply(Action::LyricsDown);
    s.apply(Action::LyricsDown);
    s.apply(Action::LyricsSeek);
    assert_eq!(s.engine().position, 30.0);

    // Following playback again.
    s.engine_mut().position = 12.0;
    s.tick();
    assert_eq!(s.lyric_view().cursor(), 0);
}

#[test]
fn focus_stays_on_the_queue_without_lyrics() {
    let mut s = session();
    s.apply(Action::SwitchFocus);
    assert_eq!(s.focus(), Focus::Queue);
}

#[test]
fn feature_toggles_are_reported() {
    let mut s = session();
    s.take_effects();
    s.apply(Action::Toggle(Feature::Stream));
    assert!(s.features().stream);
    assert_eq!(
        s.take_effects(),
        vec![Effect::FeatureToggled(Feature::Stream, true)]
    );
}

#[test]
fn snapshot_describes_the_visible_queue() {
    let mut s = session();
    s.apply(Action::CursorDown);
    let snap = s.snapshot();
    assert_eq!(snap.rows.len(), 3);
    assert!(snap.rows[0].playing);
    assert!(snap.rows[1].selected);
    assert_eq!(snap.rows[2].title, "C");
    let np = snap.now_playing.unwrap();
    assert_eq!((np.id, np.pos, np.queue_len), (0, 1, 3));
    assert_eq!(snap.volume, 50);
    assert!(snap.lyrics.is_none());
}
