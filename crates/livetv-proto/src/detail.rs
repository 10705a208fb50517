//! Channel detail page: record resolution and similar-channel picks.

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::channel::Channel;
use crate::query::FetchError;

/// Most similar channels shown under the player.
pub const SIMILAR_LIMIT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Loading,
    Found(Channel),
    NotFound,
}

/// Works out which channel a detail page shows.
///
/// Navigation state wins outright. Without it the page waits for the
/// working set (every category's channels) and scans it by name. Either
/// way the working set is also what similar channels are drawn from.
#[derive(Debug, Clone)]
pub struct DetailResolver {
    id: String,
    resolution: Resolution,
    working_set: Option<Arc<Vec<Channel>>>,
}

impl DetailResolver {
    pub fn from_navigation(id: impl Into<String>, state: Option<Channel>) -> Self {
        let resolution = match state {
            Some(channel) => Resolution::Found(channel),
            None => Resolution::Loading,
        };
        Self {
            id: id.into(),
            resolution,
            working_set: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn channel(&self) -> Option<&Channel> {
        match &self.resolution {
            Resolution::Found(channel) => Some(channel),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.resolution == Resolution::Loading
    }

    pub fn working_set(&self) -> Option<&[Channel]> {
        self.working_set.as_deref().map(Vec::as_slice)
    }

    /// Feed in the settled working-set fetch. A failure settles a pending
    /// lookup as not found rather than leaving it loading.
    pub fn apply_working_set(&mut self, result: Result<Arc<Vec<Channel>>, FetchError>) {
        match result {
            Ok(set) => {
                if self.resolution == Resolution::Loading {
                    self.resolution = match find_channel(&set, &self.id) {
                        Some(channel) => Resolution::Found(channel.clone()),
                        None => Resolution::NotFound,
                    };
                }
                self.working_set = Some(set);
            }
            Err(_) => {
                if self.resolution == Resolution::Loading {
                    self.resolution = Resolution::NotFound;
                }
            }
        }
    }
}

pub fn find_channel<'a>(channels: &'a [Channel], name: &str) -> Option<&'a Channel> {
    channels.iter().find(|c| c.channel_name == name)
}

// ── Similar channels ─────────────────────────────────────────────────────────

/// Source of randomness for similar-channel picks.
pub trait Sampler {
    /// `amount` distinct indices out of `0..len`, in pick order.
    fn pick(&mut self, len: usize, amount: usize) -> Vec<usize>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSampler;

impl Sampler for RandomSampler {
    fn pick(&mut self, len: usize, amount: usize) -> Vec<usize> {
        let mut rng = rand::thread_rng();
        rand::seq::index::sample(&mut rng, len, amount.min(len)).into_vec()
    }
}

/// Reproducible picks, for tests and snapshots.
#[derive(Debug, Clone)]
pub struct SeededSampler {
    rng: StdRng,
}

impl SeededSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Sampler for SeededSampler {
    fn pick(&mut self, len: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.rng, len, amount.min(len)).into_vec()
    }
}

/// Up to [`SIMILAR_LIMIT`] channels from `current`'s category, never
/// `current` itself and never two with the same name.
pub fn similar_channels(
    current: &Channel,
    working_set: &[Channel],
    sampler: &mut dyn Sampler,
) -> Vec<Channel> {
    let mut seen = HashSet::new();
    let candidates: Vec<&Channel> = working_set
        .iter()
        .filter(|c| c.category == current.category && c.channel_name != current.channel_name)
        .filter(|c| seen.insert(c.channel_name.as_str()))
        .collect();

    let amount = SIMILAR_LIMIT.min(candidates.len());
    sampler
        .pick(candidates.len(), amount)
        .into_iter()
        .filter_map(|i| candidates.get(i).map(|c| (*c).clone()))
        .collect()
}
