//! Per-level ownership of decoded trajectories and player metadata.
//!
//! Population decodes every run in parallel, then folds the results back
//! in source order so that id assignment and duplicate handling do not
//! depend on thread scheduling.

use crate::inflate::{DecompressError, inflate};
use crate::leaderboard::FinishRecord;
use crate::replay::{DecodeError, DecodedReplay, ReplayDecoder, TerminationPolicy, Trajectory};
use crate::session::SessionError;
use crate::source::{ProfileMap, RunRow};
use ghostreel_shared::{Character, CountryCode};
use hashbrown::{HashMap, HashSet};
use image::RgbaImage;
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;

/// Dense index of a player within one level session.
pub type PlayerId = usize;

/// Why a single player's run was dropped.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("decompression failed: {0}")]
    Decompress(#[from] DecompressError),

    #[error("malformed replay: {0}")]
    Format(#[from] DecodeError),

    #[error("replay has no frames")]
    EmptyTrajectory,
}

/// Static per-player data.
#[derive(Debug, Clone)]
pub struct PlayerMeta {
    pub external_id: String,
    pub name: String,
    pub code: String,
    pub country: Option<CountryCode>,
    pub character: Character,
    pub finish_time_ms: u64,
    pub avatar_url: Option<String>,
    /// Thumbnail owned by the avatar cache.
    pub avatar: Option<Arc<RgbaImage>>,
}

/// Knobs for [`TrajectoryStore::populate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    pub policy: TerminationPolicy,
    /// Keep only the N fastest finishers.
    pub only_fastest: Option<usize>,
    /// Stop ingesting after N successfully decoded players.
    pub max_players: Option<usize>,
}

struct Entry {
    meta: PlayerMeta,
    trajectory: Trajectory,
}

/// Length of the leading run of `rows` that brings in at most `open`
/// players not already in `known`.
fn admissible_rows(rows: &[RunRow], known: &HashMap<&str, usize>, open: usize) -> usize {
    let mut fresh: HashSet<&str> = HashSet::new();
    for (i, row) in rows.iter().enumerate() {
        let id = row.player_id.as_str();
        if known.contains_key(id) || fresh.contains(id) {
            continue;
        }
        if fresh.len() == open {
            return i;
        }
        fresh.insert(id);
    }
    rows.len()
}

/// All decoded players of one level.
#[derive(Debug)]
pub struct TrajectoryStore {
    level_id: u32,
    players: Vec<PlayerMeta>,
    trajectories: Vec<Trajectory>,
    dropped: usize,
}

impl TrajectoryStore {
    /// Decode every row and build the store.
    ///
    /// Rows that fail to decompress or decode are logged and dropped. Fails
    /// only if no row survives. With `max_players` set, rows past the point
    /// where the limit is filled are never decoded.
    pub fn populate(
        level_id: u32,
        rows: &[RunRow],
        profiles: &ProfileMap,
        options: StoreOptions,
    ) -> Result<Self, SessionError> {
        let decoder = ReplayDecoder::new(options.policy);

        let mut entries: Vec<Entry> = Vec::new();
        let mut index_of: HashMap<&str, usize> = HashMap::new();
        let mut dropped = 0;
        let mut next = 0;

        while next < rows.len() {
            let end = match options.max_players {
                Some(max) => {
                    let open = max.saturating_sub(entries.len());
                    next + admissible_rows(&rows[next..], &index_of, open)
                }
                None => rows.len(),
            };
            if end == next {
                tracing::debug!("Player limit reached, ignoring remaining runs");
                break;
            }
            let window = &rows[next..end];
            next = end;

            // Fan out: each decode is independent.
            let decoded: Vec<_> = window
                .par_iter()
                .map(|row| -> Result<DecodedReplay, PlayerError> {
                    let raw = inflate(&row.replay)?;
                    let replay = decoder.decode(&raw)?;
                    if replay.trajectory.is_empty() {
                        return Err(PlayerError::EmptyTrajectory);
                    }
                    Ok(replay)
                })
                .collect();

            // Fan in, in source order.
            for (row, result) in window.iter().zip(decoded) {
                let replay = match result {
                    Ok(replay) => replay,
                    Err(e) => {
                        tracing::warn!(
                            "Level {}: dropping player {}: {}",
                            level_id,
                            row.player_id,
                            e
                        );
                        dropped += 1;
                        continue;
                    }
                };

                let profile = profiles.get(row.player_id.as_str());
                if profile.is_none() {
                    tracing::debug!("No profile for player {}", row.player_id);
                }
                let meta = PlayerMeta {
                    external_id: row.player_id.clone(),
                    name: profile
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| row.player_id.clone()),
                    code: profile.map(|p| p.code.clone()).unwrap_or_default(),
                    country: profile.and_then(|p| p.country),
                    character: replay.header.character,
                    finish_time_ms: row.time_ms,
                    avatar_url: profile.and_then(|p| p.avatar_url.clone()),
                    avatar: None,
                };
                let entry = Entry {
                    meta,
                    trajectory: replay.trajectory,
                };

                match index_of.get(row.player_id.as_str()) {
                    // A later run for the same player replaces the earlier one.
                    Some(&index) => entries[index] = entry,
                    None => {
                        index_of.insert(row.player_id.as_str(), entries.len());
                        entries.push(entry);
                    }
                }
            }
        }

        if let Some(keep) = options.only_fastest {
            entries = keep_fastest(entries, keep);
        }

        if entries.is_empty() {
            return Err(SessionError::EmptySession { level_id });
        }

        let (players, trajectories) = entries
            .into_iter()
            .map(|entry| (entry.meta, entry.trajectory))
            .unzip();

        Ok(Self {
            level_id,
            players,
            trajectories,
            dropped,
        })
    }

    /// Build a store directly from decoded data.
    pub fn from_parts(level_id: u32, parts: Vec<(PlayerMeta, Trajectory)>) -> Self {
        let (players, trajectories) = parts.into_iter().unzip();
        Self {
            level_id,
            players,
            trajectories,
            dropped: 0,
        }
    }

    pub fn level_id(&self) -> u32 {
        self.level_id
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Number of runs dropped during population.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn player(&self, id: PlayerId) -> &PlayerMeta {
        &self.players[id]
    }

    pub fn trajectory(&self, id: PlayerId) -> &Trajectory {
        &self.trajectories[id]
    }

    pub fn players(&self) -> &[PlayerMeta] {
        &self.players
    }

    pub fn trajectories(&self) -> &[Trajectory] {
        &self.trajectories
    }

    pub fn ids(&self) -> std::ops::Range<PlayerId> {
        0..self.players.len()
    }

    pub fn set_avatar(&mut self, id: PlayerId, avatar: Arc<RgbaImage>) {
        self.players[id].avatar = Some(avatar);
    }

    /// One record per player, in id order.
    pub fn finish_records(&self) -> Vec<FinishRecord> {
        self.players
            .iter()
            .enumerate()
            .map(|(player, meta)| FinishRecord {
                player,
                time_ms: meta.finish_time_ms,
            })
            .collect()
    }

    pub fn best_time(&self) -> Option<u64> {
        self.players.iter().map(|p| p.finish_time_ms).min()
    }

    pub fn worst_time(&self) -> Option<u64> {
        self.players.iter().map(|p| p.finish_time_ms).max()
    }

    /// Length of the longest trajectory.
    pub fn max_frames(&self) -> usize {
        self.trajectories.iter().map(Trajectory::len).max().unwrap_or(0)
    }
}

/// Keep the `keep` fastest entries, preserving their relative order.
fn keep_fastest(entries: Vec<Entry>, keep: usize) -> Vec<Entry> {
    if entries.len() <= keep {
        return entries;
    }

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by_key(|&i| entries[i].meta.finish_time_ms);
    let mut kept = vec![false; entries.len()];
    for &i in order.iter().take(keep) {
        kept[i] = true;
    }

    entries
        .into_iter()
        .zip(kept)
        .filter_map(|(entry, keep)| keep.then_some(entry))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::PlayerProfile;
    use crate::test_utils::{compressed_run, straight_trajectory};

    fn profiles() -> ProfileMap {
        let mut map = ProfileMap::new();
        map.insert(
            "P1".to_string(),
            PlayerProfile {
                name: "alice".to_string(),
                code: "AAA".to_string(),
                country: "SE".parse().ok(),
                avatar_url: None,
            },
        );
        map
    }

    #[test]
    fn test_populate_assigns_dense_ids_in_source_order() {
        let rows = vec![
            compressed_run("P1", 500, &straight_trajectory(3), Character::Luigi),
            compressed_run("P2", 300, &straight_trajectory(5), Character::Mario),
        ];
        let store = TrajectoryStore::populate(1, &rows, &profiles(), StoreOptions::default())
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.player(0).name, "alice");
        assert_eq!(store.player(0).country.unwrap().as_str(), "SE");
        assert_eq!(store.player(0).character, Character::Luigi);
        assert_eq!(store.player(1).name, "P2");
        assert!(store.player(1).country.is_none());
        assert_eq!(store.trajectory(1).len(), 5);
        assert_eq!(store.max_frames(), 5);
        assert_eq!(store.best_time(), Some(300));
        assert_eq!(store.worst_time(), Some(500));
    }

    #[test]
    fn test_bad_rows_are_dropped() {
        let mut corrupt = compressed_run("P2", 300, &straight_trajectory(3), Character::Mario);
        corrupt.replay = vec![0xde, 0xad];
        let rows = vec![
            compressed_run("P1", 500, &straight_trajectory(3), Character::Mario),
            corrupt,
            compressed_run("P3", 700, &Trajectory::default(), Character::Mario),
        ];

        let store = TrajectoryStore::populate(1, &rows, &profiles(), StoreOptions::default())
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.dropped(), 2);
        assert_eq!(store.player(0).external_id, "P1");
    }

    #[test]
    fn test_all_rows_bad_is_empty_session() {
        let mut corrupt = compressed_run("P1", 300, &straight_trajectory(3), Character::Mario);
        corrupt.replay = vec![0xde, 0xad, 0xbe, 0xef];

        let err = TrajectoryStore::populate(42, &[corrupt], &profiles(), StoreOptions::default())
            .unwrap_err();
        assert!(matches!(err, SessionError::EmptySession { level_id: 42 }));
    }

    #[test]
    fn test_duplicate_player_keeps_first_id_and_latest_run() {
        let rows = vec![
            compressed_run("P1", 500, &straight_trajectory(3), Character::Mario),
            compressed_run("P2", 400, &straight_trajectory(3), Character::Mario),
            compressed_run("P1", 450, &straight_trajectory(7), Character::Toad),
        ];
        let store = TrajectoryStore::populate(1, &rows, &profiles(), StoreOptions::default())
            .unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.player(0).external_id, "P1");
        assert_eq!(store.player(0).finish_time_ms, 450);
        assert_eq!(store.player(0).character, Character::Toad);
        assert_eq!(store.trajectory(0).len(), 7);
    }

    #[test]
    fn test_only_fastest_and_max_players() {
        let rows: Vec<_> = [("A", 900), ("B", 100), ("C", 500), ("D", 300)]
            .iter()
            .map(|(pid, t)| compressed_run(pid, *t, &straight_trajectory(2), Character::Mario))
            .collect();

        let fastest = TrajectoryStore::populate(
            1,
            &rows,
            &ProfileMap::new(),
            StoreOptions {
                only_fastest: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
        let ids: Vec<_> = fastest.players().iter().map(|p| p.external_id.as_str()).collect();
        assert_eq!(ids, ["B", "D"]);

        let limited = TrajectoryStore::populate(
            1,
            &rows,
            &ProfileMap::new(),
            StoreOptions {
                max_players: Some(3),
                ..Default::default()
            },
        )
        .unwrap();
        let ids: Vec<_> = limited.players().iter().map(|p| p.external_id.as_str()).collect();
        assert_eq!(ids, ["A", "B", "C"]);
    }

    #[test]
    fn test_max_players_skips_decoding_past_limit() {
        let corrupt = |pid: &str| {
            let mut row = compressed_run(pid, 300, &straight_trajectory(3), Character::Mario);
            row.replay = vec![0xde, 0xad, 0xbe, 0xef];
            row
        };
        let rows = vec![
            compressed_run("A", 500, &straight_trajectory(3), Character::Mario),
            corrupt("B"),
            compressed_run("C", 400, &straight_trajectory(3), Character::Mario),
            compressed_run("A", 450, &straight_trajectory(7), Character::Mario),
            compressed_run("D", 200, &straight_trajectory(3), Character::Mario),
            corrupt("E"),
        ];

        let store = TrajectoryStore::populate(
            1,
            &rows,
            &ProfileMap::new(),
            StoreOptions {
                max_players: Some(2),
                ..Default::default()
            },
        )
        .unwrap();

        let ids: Vec<_> = store.players().iter().map(|p| p.external_id.as_str()).collect();
        assert_eq!(ids, ["A", "C"]);
        // A's rerun still lands; E is never decoded.
        assert_eq!(store.trajectory(0).len(), 7);
        assert_eq!(store.dropped(), 1);
    }

    #[test]
    fn test_admissible_rows_counts_new_players_only() {
        let rows: Vec<_> = ["A", "B", "A", "C", "B"]
            .iter()
            .map(|pid| compressed_run(pid, 100, &straight_trajectory(2), Character::Mario))
            .collect();
        let mut known = HashMap::new();
        assert_eq!(admissible_rows(&rows, &known, 2), 3);
        assert_eq!(admissible_rows(&rows, &known, 0), 0);

        known.insert("A", 0);
        assert_eq!(admissible_rows(&rows, &known, 0), 1);
        assert_eq!(admissible_rows(&rows, &known, 5), 5);
    }

    #[test]
    fn test_finish_records_follow_ids() {
        let rows = vec![
            compressed_run("P1", 500, &straight_trajectory(2), Character::Mario),
            compressed_run("P2", 300, &straight_trajectory(2), Character::Mario),
        ];
        let store = TrajectoryStore::populate(1, &rows, &profiles(), StoreOptions::default())
            .unwrap();
        let records = store.finish_records();
        assert_eq!(records[0], FinishRecord { player: 0, time_ms: 500 });
        assert_eq!(records[1], FinishRecord { player: 1, time_ms: 300 });
    }
}
