use folio_ambience::storage::keys;
use folio_ambience::{
    AudioController, AudioOptions, Bind, KeyValueStore, MemoryMedia, MemoryStore, PlayStart,
    PlayerState, RecordingView, StartOutcome, Track,
};

type Player = AudioController<MemoryMedia, RecordingView, MemoryStore>;

fn new_player(local: MemoryStore, session: MemoryStore, media: MemoryMedia) -> Player {
    let mut player = Player::new(local, session, AudioOptions::default());
    assert_eq!(player.bind(Some(media), Some(RecordingView::default())), Bind::Bound);
    player
}

#[test]
fn load_play_close() {
    let mut player = new_player(MemoryStore::new(), MemoryStore::new(), MemoryMedia::new());
    player.load_track(Track::new("a.mp3", "T", "A"));
    assert_eq!(player.play(), StartOutcome::Started);
    assert!(player.media().is_some_and(|m| !m.paused));

    let stored: serde_json::Value = player
        .store()
        .local()
        .get(keys::PLAYBACK)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap();
    assert_eq!(stored["track"]["url"], "a.mp3");
    assert_eq!(stored["isPlaying"], true);
    assert_eq!(stored["volume"], 0.7);

    player.close();
    assert!(player.media().is_some_and(|m| m.paused));
    assert!(!player.store().local().contains(keys::PLAYBACK));
    assert!(!player.store().session().contains(keys::TRANSITION));
    assert_eq!(player.state(), PlayerState::NoTrack);
}

#[test]
fn navigation_hand_off_between_pages() {
    // Page one plays a track, then the page is swapped out.
    let mut page_one = new_player(MemoryStore::new(), MemoryStore::new(), MemoryMedia::new());
    page_one.load_track(Track::new("set.mp3", "Live Set", "Someone"));
    page_one.set_volume(35.0);
    if let Some(media) = page_one.media_mut() {
        media.current_time = 754.26;
        media.duration = 3600.0;
    }
    assert!(page_one.before_navigation());
    let (local, session) = page_one.store().clone().into_inner();

    // Page two starts from the same browser storage with fresh elements.
    let mut page_two = new_player(local, session, MemoryMedia::new());
    assert_eq!(page_two.state(), PlayerState::Paused);
    assert_eq!(page_two.on_ready(), None);

    let media = page_two.media().cloned().unwrap();
    assert_eq!(media.source, "set.mp3");
    assert!((media.current_time - 754.26).abs() <= 0.1);
    assert_eq!(media.volume, 0.35);
    assert!(media.paused);
    assert!(page_two.needs_resume());
    assert_eq!(page_two.current_track().map(|t| t.display_title()), Some("Live Set"));

    // One gesture resumes.
    assert_eq!(page_two.toggle_play_pause(), Some(StartOutcome::Started));
    assert!(!page_two.needs_resume());
}

#[test]
fn snapshot_is_applied_once() {
    let mut player = new_player(MemoryStore::new(), MemoryStore::new(), MemoryMedia::new());
    player.load_track(Track::new("a.mp3", "T", "A"));
    player.before_navigation();
    player.after_navigation(Some(MemoryMedia::new()), Some(RecordingView::default()));
    player.on_ready();
    player.close();

    // A reload after closing must not bring the track back.
    let (local, session) = player.store().clone().into_inner();
    let reloaded = new_player(local, session, MemoryMedia::new());
    assert_eq!(reloaded.state(), PlayerState::NoTrack);
}

#[test]
fn autoplay_refused_twice_needs_a_gesture() {
    let media = MemoryMedia::new().respond_with([PlayStart::Rejected, PlayStart::Rejected]);
    let mut player = new_player(MemoryStore::new(), MemoryStore::new(), media);

    assert_eq!(player.load_track(Track::new("a.mp3", "T", "A")), StartOutcome::Deferred);
    assert_eq!(player.on_ready(), Some(StartOutcome::NotStarted));
    assert!(player.view().is_some_and(|v| v.needs_resume && !v.playing));

    let saved = player.store().load_playback().unwrap();
    assert!(!saved.is_playing);
}

#[test]
fn missing_elements_retry_then_bind() {
    let mut player = Player::new(MemoryStore::new(), MemoryStore::new(), AudioOptions::default());
    assert_eq!(player.bind(None, None), Bind::RetryAfter(50));
    assert_eq!(
        player.bind(Some(MemoryMedia::new()), Some(RecordingView::default())),
        Bind::Bound
    );
    assert!(player.is_bound());
}
