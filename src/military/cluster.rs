use super::damage::BlastModel;
use super::dbscan::*;
use super::unittype::UnitTypes;
use crate::board::BoardState;
use crate::geometry::*;
use crate::model::*;
use log::*;
use serde::{Deserialize, Serialize};
use shrinkwraprs::Shrinkwrap;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

/// Number of recent centre samples kept for heading estimation.
pub const POSITION_HISTORY_SIZE: usize = 3;
/// Ticks between two consecutive centre samples.
pub const POSITION_UPDATE_FREQUENCY: u32 = 20;
/// Share of airborne members above which a cluster is treated as fast moving.
const HIGH_SPEED_AERIAL_SHARE: f64 = 0.8;
/// Every type must exceed this share of members for a cluster to be mixed.
const SANDWICH_MIN_TYPE_SHARE: f64 = 0.1;

/// Fingerprint of a cluster's sorted member ids. Equal only for equal membership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClusterId(pub u64);

impl ClusterId {
    pub fn from_members(members: &[UnitId]) -> ClusterId {
        let mut sorted = members.to_vec();
        sorted.sort_unstable();

        let mut hasher = DefaultHasher::new();
        sorted.hash(&mut hasher);

        ClusterId(hasher.finish())
    }
}

/// A density cluster of enemy units.
#[derive(Clone, Debug)]
pub struct Cluster {
    id: ClusterId,
    members: Vec<UnitId>,
    center: Option<Point>,
    history: VecDeque<Point>,
}

impl Cluster {
    pub fn new(members: Vec<UnitId>, board: &BoardState) -> Cluster {
        let mut cluster = Cluster {
            id: ClusterId::from_members(&members),
            members,
            center: None,
            history: VecDeque::with_capacity(POSITION_HISTORY_SIZE),
        };

        cluster.reset_center(board);
        cluster
    }

    pub fn id(&self) -> ClusterId {
        self.id
    }

    pub fn members(&self) -> &[UnitId] {
        &self.members
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn alive_members<'a>(&'a self, board: &'a BoardState) -> impl Iterator<Item = &'a Unit> + 'a {
        self.members
            .iter()
            .filter_map(move |id| board.unit(*id))
            .filter(|u| u.is_alive())
    }

    pub fn is_alive(&self, board: &BoardState) -> bool {
        self.alive_members(board).next().is_some()
    }

    /// Cached mean position of alive members. `None` once every member is dead.
    pub fn center(&self) -> Option<Point> {
        self.center
    }

    /// Recompute the cached centre from current member positions.
    pub fn reset_center(&mut self, board: &BoardState) {
        self.center = Point::mean(self.alive_members(board).map(|u| u.position));
    }

    /// Type of the first alive member, used as the cluster's representative type.
    pub fn lead_type(&self, board: &BoardState) -> Option<UnitType> {
        self.alive_members(board).next().map(|u| u.unit_type)
    }

    pub fn unit_types(&self, board: &BoardState) -> UnitTypes {
        self.alive_members(board).map(|u| u.unit_type).collect()
    }

    pub fn is_high_speed(&self, board: &BoardState) -> bool {
        let (alive, aerial) = self
            .alive_members(board)
            .fold((0usize, 0usize), |(alive, aerial), u| (alive + 1, aerial + u.is_aerial() as usize));

        alive > 0 && aerial as f64 >= HIGH_SPEED_AERIAL_SHARE * alive as f64
    }

    /// Mixed formation: more than one type and every present type above the minimum share.
    pub fn is_sandwich(&self, board: &BoardState) -> bool {
        let mut counts: HashMap<UnitType, usize> = HashMap::new();
        let mut alive = 0;

        for unit in self.alive_members(board) {
            *counts.entry(unit.unit_type).or_insert(0) += 1;
            alive += 1;
        }

        counts.len() > 1 && counts.values().all(|count| *count as f64 > SANDWICH_MIN_TYPE_SHARE * alive as f64)
    }

    // ─── Motion ─────────────────────────────────────────────────────────────

    pub fn mark_position(&mut self) {
        if let Some(center) = self.center {
            if self.history.len() == POSITION_HISTORY_SIZE {
                self.history.pop_front();
            }
            self.history.push_back(center);
        }
    }

    pub fn history(&self) -> impl Iterator<Item = &Point> {
        self.history.iter()
    }

    /// Displacement per tick estimated from the two latest samples.
    pub fn heading(&self) -> Option<Point> {
        let mut recent = self.history.iter().rev();
        let last = *recent.next()?;
        let previous = *recent.next()?;

        Some((last - previous) / POSITION_UPDATE_FREQUENCY as f64)
    }

    pub fn speed(&self) -> f64 {
        self.heading().map(|h| h.length()).unwrap_or(0.0)
    }

    pub fn projected_center(&self, ticks: u32) -> Option<Point> {
        let center = self.center?;

        Some(match self.heading() {
            Some(heading) => center + heading * ticks as f64,
            None => center,
        })
    }

    /// Where a delayed strike should land: ahead of fast clusters, on the centre otherwise.
    pub fn suggested_strike_point(&self, board: &BoardState, delay: u32) -> Option<Point> {
        if self.is_high_speed(board) {
            self.projected_center(delay)
        } else {
            self.center
        }
    }

    pub fn damage_at(&self, board: &BoardState, point: Point, blast: &BlastModel) -> f64 {
        blast.total_damage(self.alive_members(board), point)
    }
}

/// Result of one clustering run over the enemy units.
#[derive(Shrinkwrap, Clone, Debug, Default)]
pub struct ClusterSet {
    #[shrinkwrap(main_field)]
    clusters: Vec<Cluster>,
    noise: Vec<UnitId>,
}

impl ClusterSet {
    pub fn build(board: &BoardState, units: &[UnitId], dbscan: &Dbscan) -> ClusterSet {
        let tracked: Vec<&Unit> = units.iter().filter_map(|id| board.unit(*id)).collect();
        let points: Vec<Point> = tracked.iter().map(|u| u.position).collect();

        let partition = dbscan.run(&points);

        let clusters = partition
            .clusters
            .into_iter()
            .map(|indices| Cluster::new(indices.into_iter().map(|i| tracked[i].id).collect(), board))
            .collect();

        let noise = partition.noise.into_iter().map(|i| tracked[i].id).collect();

        ClusterSet { clusters, noise }
    }

    /// Keep the position history of clusters whose membership did not change.
    pub fn inherit_history(&mut self, previous: &ClusterSet) {
        for cluster in self.clusters.iter_mut() {
            if let Some(old) = previous.iter().find(|c| c.id == cluster.id) {
                cluster.history = old.history.clone();
            }
        }
    }

    pub fn noise(&self) -> &[UnitId] {
        &self.noise
    }

    pub fn noise_share(&self) -> f64 {
        let clustered: usize = self.clusters.iter().map(|c| c.size()).sum();
        let total = clustered + self.noise.len();

        if total == 0 {
            0.0
        } else {
            self.noise.len() as f64 / total as f64
        }
    }

    pub fn get(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.id == id)
    }

    pub fn reset_centers(&mut self, board: &BoardState) {
        for cluster in self.clusters.iter_mut() {
            cluster.reset_center(board);
        }
    }

    pub fn mark_positions(&mut self) {
        for cluster in self.clusters.iter_mut() {
            cluster.mark_position();
        }
    }

    pub fn log_summary(&self) {
        info!(
            "[Clusters] {} clusters, {} noise units ({:.0}% noise)",
            self.clusters.len(),
            self.noise.len(),
            self.noise_share() * 100.0
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enemy(id: UnitId, x: f64, y: f64, unit_type: UnitType) -> Unit {
        Unit {
            id,
            position: Point::new(x, y),
            radius: 2.0,
            player_id: 2,
            unit_type,
            durability: 100,
            max_durability: 100,
            max_speed: 0.6,
            vision_range: 80.0,
            ground_attack_range: 20.0,
            aerial_attack_range: 20.0,
            ground_damage: 50,
            aerial_damage: 50,
            attack_cooldown_ticks: 60,
            remaining_attack_cooldown_ticks: 0,
            groups: Vec::new(),
            selected: false,
        }
    }

    fn board_with(units: Vec<Unit>) -> BoardState {
        let mut board = BoardState::new();
        board
            .apply_snapshot(&TickSnapshot {
                players: vec![Player {
                    id: 1,
                    me: true,
                    ..Default::default()
                }],
                new_units: units,
                ..Default::default()
            })
            .unwrap();
        board
    }

    #[test]
    fn id_ignores_member_order() {
        assert_eq!(ClusterId::from_members(&[3, 1, 2]), ClusterId::from_members(&[1, 2, 3]));
        assert_ne!(ClusterId::from_members(&[1, 2, 3]), ClusterId::from_members(&[1, 2, 4]));
    }

    #[test]
    fn center_is_mean_of_alive_members() {
        let board = board_with(vec![enemy(1, 0.0, 0.0, UnitType::Tank), enemy(2, 10.0, 20.0, UnitType::Tank)]);
        let cluster = Cluster::new(vec![1, 2, 99], &board);

        assert_eq!(cluster.center(), Some(Point::new(5.0, 10.0)));
        assert_eq!(cluster.size(), 3);
        assert!(cluster.is_alive(&board));
    }

    #[test]
    fn heading_uses_latest_two_samples() {
        let mut board = board_with(vec![enemy(1, 0.0, 0.0, UnitType::Fighter)]);
        let mut cluster = Cluster::new(vec![1], &board);
        cluster.mark_position();

        board
            .apply_snapshot(&TickSnapshot {
                tick: 20,
                unit_updates: vec![UnitUpdate::moved(1, Point::new(40.0, 0.0))],
                ..Default::default()
            })
            .unwrap();
        cluster.reset_center(&board);
        cluster.mark_position();

        assert_eq!(cluster.heading(), Some(Point::new(2.0, 0.0)));
        assert!(cluster.is_high_speed(&board));
        assert_eq!(cluster.suggested_strike_point(&board, 30), Some(Point::new(100.0, 0.0)));

        for _ in 0..5 {
            cluster.mark_position();
        }
        assert_eq!(cluster.history().count(), POSITION_HISTORY_SIZE);
    }

    #[test]
    fn sandwich_requires_every_type_above_share() {
        let mut units: Vec<Unit> = (0..9).map(|i| enemy(i, i as f64, 0.0, UnitType::Tank)).collect();
        units.push(enemy(9, 9.0, 0.0, UnitType::Ifv));
        let board = board_with(units);

        let mono_heavy = Cluster::new((0..10).collect(), &board);
        assert!(!mono_heavy.is_sandwich(&board));

        let mixed = Cluster::new((6..10).collect(), &board);
        assert!(mixed.is_sandwich(&board));
    }

    #[test]
    fn history_survives_recluster_with_same_members() {
        let board = board_with((0..6).map(|i| enemy(i, i as f64 * 2.0, 0.0, UnitType::Tank)).collect());
        let ids: Vec<UnitId> = (0..6).collect();
        let dbscan = Dbscan::new(15.0, 3);

        let mut first = ClusterSet::build(&board, &ids, &dbscan);
        first.mark_positions();

        let mut second = ClusterSet::build(&board, &ids, &dbscan);
        second.inherit_history(&first);

        assert_eq!(second.len(), 1);
        assert_eq!(second[0].history().count(), 1);
        assert_eq!(second.noise_share(), 0.0);
    }
}
