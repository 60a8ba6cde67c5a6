use crate::geometry::*;
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Label {
    Noise,
    Cluster(usize),
}

/// Indices into the clustered slice, split into clusters and noise.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partition {
    pub clusters: Vec<Vec<usize>>,
    pub noise: Vec<usize>,
}

impl Partition {
    /// Member sets sorted canonically, for comparing partitions irrespective of
    /// discovery order.
    pub fn canonical(&self) -> Vec<Vec<usize>> {
        let mut clusters: Vec<Vec<usize>> = self
            .clusters
            .iter()
            .map(|members| {
                let mut members = members.clone();
                members.sort_unstable();
                members
            })
            .collect();

        clusters.sort();
        clusters
    }
}

/// Density-based clustering.
///
/// An entity is a core entity when at least `min_points` *other* entities lie
/// strictly closer than `epsilon`. Clusters grow by absorbing everything within
/// `epsilon` of a core entity; entities reachable from no core entity are noise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dbscan {
    pub epsilon: f64,
    pub min_points: usize,
}

impl Default for Dbscan {
    fn default() -> Dbscan {
        Dbscan {
            epsilon: 20.0,
            min_points: 10,
        }
    }
}

impl Dbscan {
    pub fn new(epsilon: f64, min_points: usize) -> Dbscan {
        Dbscan { epsilon, min_points }
    }

    pub fn run(&self, points: &[Point]) -> Partition {
        let mut labels: Vec<Option<Label>> = vec![None; points.len()];
        let mut cluster_count = 0;

        for index in 0..points.len() {
            if labels[index].is_some() {
                continue;
            }

            let neighbours = self.neighbours(points, index);
            if neighbours.len() < self.min_points {
                labels[index] = Some(Label::Noise);
                continue;
            }

            let cluster = cluster_count;
            cluster_count += 1;
            labels[index] = Some(Label::Cluster(cluster));

            let mut frontier: VecDeque<usize> = neighbours.into();
            while let Some(candidate) = frontier.pop_front() {
                match labels[candidate] {
                    // Border entity: joins the cluster but does not expand it.
                    Some(Label::Noise) => labels[candidate] = Some(Label::Cluster(cluster)),
                    Some(Label::Cluster(_)) => {}
                    None => {
                        labels[candidate] = Some(Label::Cluster(cluster));

                        let reach = self.neighbours(points, candidate);
                        if reach.len() >= self.min_points {
                            frontier.extend(reach.into_iter().filter(|n| !matches!(labels[*n], Some(Label::Cluster(_)))));
                        }
                    }
                }
            }
        }

        let mut partition = Partition {
            clusters: vec![Vec::new(); cluster_count],
            noise: Vec::new(),
        };

        for (index, label) in labels.into_iter().enumerate() {
            match label {
                Some(Label::Cluster(cluster)) => partition.clusters[cluster].push(index),
                _ => partition.noise.push(index),
            }
        }

        partition
    }

    fn neighbours(&self, points: &[Point], index: usize) -> Vec<usize> {
        let origin = points[index];
        let limit = self.epsilon * self.epsilon;

        points
            .iter()
            .enumerate()
            .filter(|(other, p)| *other != index && origin.squared_distance_to(**p) < limit)
            .map(|(other, _)| other)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn blob(center: Point, count: usize, spread: f64) -> Vec<Point> {
        (0..count)
            .map(|i| {
                let angle = i as f64 / count as f64 * std::f64::consts::TAU;
                center + Point::new(angle.cos(), angle.sin()) * spread
            })
            .collect()
    }

    #[test]
    fn empty_input_produces_no_clusters() {
        let partition = Dbscan::new(20.0, 5).run(&[]);
        assert!(partition.clusters.is_empty());
        assert!(partition.noise.is_empty());
    }

    #[test]
    fn min_points_above_population_is_all_noise() {
        let points = blob(Point::new(100.0, 100.0), 6, 3.0);
        let partition = Dbscan::new(20.0, 10).run(&points);

        assert!(partition.clusters.is_empty());
        assert_eq!(partition.noise.len(), 6);
    }

    #[test]
    fn blob_and_outliers() {
        let mut points = blob(Point::new(200.0, 200.0), 10, 7.0);
        points.push(Point::new(600.0, 600.0));
        points.push(Point::new(20.0, 900.0));

        let partition = Dbscan::new(20.0, 5).run(&points);

        assert_eq!(partition.clusters.len(), 1);
        assert_eq!(partition.clusters[0].len(), 10);
        assert_eq!(partition.noise, vec![10, 11]);
    }

    #[test]
    fn border_entity_joins_without_expanding() {
        // Four entities packed together, a border entity 15 from the pack edge
        // and one more 15 beyond it that only the border reaches.
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(16.0, 0.0),
            Point::new(31.0, 0.0),
        ];

        let partition = Dbscan::new(16.0, 4).run(&points);

        assert_eq!(partition.canonical(), vec![vec![0, 1, 2, 3, 4]]);
        assert_eq!(partition.noise, vec![5]);
    }

    #[test]
    fn partition_is_independent_of_input_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut points = blob(Point::new(100.0, 100.0), 12, 6.0);
        points.extend(blob(Point::new(400.0, 120.0), 9, 5.0));
        points.push(Point::new(800.0, 800.0));

        let dbscan = Dbscan::new(15.0, 4);
        let baseline = dbscan.run(&points).canonical();

        let mut order: Vec<usize> = (0..points.len()).collect();
        order.shuffle(&mut rng);
        let shuffled: Vec<Point> = order.iter().map(|i| points[*i]).collect();

        let remapped: Vec<Vec<usize>> = dbscan
            .run(&shuffled)
            .clusters
            .iter()
            .map(|members| members.iter().map(|i| order[*i]).collect())
            .collect();
        let remapped = Partition {
            clusters: remapped,
            noise: Vec::new(),
        }
        .canonical();

        assert_eq!(baseline, remapped);
        assert_eq!(dbscan.run(&points).canonical(), baseline);
    }
}
