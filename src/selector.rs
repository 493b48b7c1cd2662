// Restaurant selection loop.
//
// Walks the search results one page at a time. Each page is shuffled,
// split into open and closed buckets, and offered to the user candidate by
// candidate until one is accepted. When a page runs dry the user may widen
// the pool, first to closed places on the same page, then to the next
// page of results. Every candidate is offered at most once per bucket.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::api::{Coordinate, MapsClient, PlaceRecord, ResultPage};
use crate::error::Result;
use crate::ui::{self, Prompter};

/// Lazily produces result pages for the selection loop.
pub trait PlaceSource {
    /// First page of results. Failure here is fatal to the run.
    fn first_page(&mut self) -> Result<ResultPage>;

    /// Page chained from `token`.
    fn next_page(&mut self, token: &str) -> Result<ResultPage>;
}

/// Nearby text search through [`MapsClient`].
pub struct NearbySearch<'a> {
    client: &'a MapsClient,
    coordinate: Coordinate,
    query: String,
    radius_meters: u32,
}

impl<'a> NearbySearch<'a> {
    pub fn new(
        client: &'a MapsClient,
        coordinate: Coordinate,
        query: impl Into<String>,
        radius_meters: u32,
    ) -> Self {
        NearbySearch {
            client,
            coordinate,
            query: query.into(),
            radius_meters,
        }
    }
}

impl PlaceSource for NearbySearch<'_> {
    fn first_page(&mut self) -> Result<ResultPage> {
        let spinner = ui::spinner("Searching for restaurants...");
        let page = self
            .client
            .search_nearby(self.coordinate, &self.query, self.radius_meters);
        spinner.finish_and_clear();
        page
    }

    fn next_page(&mut self, token: &str) -> Result<ResultPage> {
        let spinner = ui::spinner("Loading more results...");
        let page = self.client.search_next_page(token);
        spinner.finish_and_clear();
        page
    }
}

/// How a selection run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Accepted(PlaceRecord),
    Unselected(NoSelection),
}

/// Why nothing was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoSelection {
    /// A page came back empty.
    NoResults,
    /// Every candidate was rejected and there was nothing left to fetch,
    /// or fetching the next page failed.
    Exhausted,
    /// The user turned down widening the search.
    Declined,
}

/// Open and closed candidates of one page, each in presentation order.
#[derive(Debug, Default, PartialEq)]
pub struct Buckets {
    pub open: Vec<PlaceRecord>,
    /// Known closed and unknown status alike.
    pub closed: Vec<PlaceRecord>,
}

/// Split places into open and not-open in a single pass, keeping order.
/// Places without an open-now flag land with the closed ones.
#[must_use]
pub fn partition_by_open(places: Vec<PlaceRecord>) -> Buckets {
    let (open, closed): (Vec<_>, Vec<_>) = places
        .into_iter()
        .partition(|place| place.open_now() == Some(true));
    Buckets { open, closed }
}

/// Options carried over from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorOptions {
    /// Offer closed and unknown-status places together with open ones from
    /// the start, and never ask about them separately.
    pub include_closed: bool,
}

/// Drives the accept/reject loop over a [`PlaceSource`].
pub struct Selector<'a, S, P, R> {
    source: &'a mut S,
    prompter: &'a mut P,
    rng: R,
    options: SelectorOptions,
}

impl<'a, S, P, R> Selector<'a, S, P, R>
where
    S: PlaceSource,
    P: Prompter,
    R: Rng,
{
    pub fn new(source: &'a mut S, prompter: &'a mut P, rng: R, options: SelectorOptions) -> Self {
        Selector {
            source,
            prompter,
            rng,
            options,
        }
    }

    /// Run until a place is accepted or every way of widening the search
    /// is used up.
    ///
    /// Errors from the first search and from the console are returned.
    /// A failed next-page fetch ends the run as [`NoSelection::Exhausted`].
    pub fn run(mut self) -> Result<Selection> {
        let mut page = self.source.first_page()?;
        let mut page_number = 1usize;

        loop {
            if page.places.is_empty() {
                tracing::info!(page_number, "search page is empty");
                self.prompter.say("No restaurants found within this range!")?;
                return Ok(Selection::Unselected(NoSelection::NoResults));
            }

            let mut places = page.places;
            places.shuffle(&mut self.rng);
            let buckets = if self.options.include_closed {
                Buckets {
                    open: places,
                    closed: Vec::new(),
                }
            } else {
                partition_by_open(places)
            };
            tracing::debug!(
                page_number,
                open = buckets.open.len(),
                closed = buckets.closed.len(),
                "page partitioned"
            );

            if let Some(place) = self.offer_page(buckets)? {
                tracing::info!(page_number, place_id = %place.place_id, "place accepted");
                return Ok(Selection::Accepted(place));
            }

            self.prompter
                .say("Super Unfortunate! You have exhausted the restaurants in your area.")?;

            let Some(token) = page.next_page_token else {
                self.prompter.say("There are no more results to search.")?;
                self.prompter.say("Sorry I couldn't help :(")?;
                return Ok(Selection::Unselected(NoSelection::Exhausted));
            };

            if !self
                .prompter
                .ask_yes_no("Expand search to the next page of results? (y/n): ")?
            {
                self.prompter.say("Sorry I couldn't help :(")?;
                return Ok(Selection::Unselected(NoSelection::Declined));
            }

            page = match self.source.next_page(&token) {
                Ok(next) => next,
                Err(error) => {
                    tracing::warn!(%error, page_number, "next page fetch failed");
                    self.prompter
                        .say(&format!("Could not load more results: {error}"))?;
                    self.prompter.say("Sorry I couldn't help :(")?;
                    return Ok(Selection::Unselected(NoSelection::Exhausted));
                }
            };
            page_number += 1;
        }
    }

    /// Offer the open bucket, then (if the user agrees) the closed one.
    fn offer_page(&mut self, buckets: Buckets) -> Result<Option<PlaceRecord>> {
        let Buckets { open, closed } = buckets;

        if open.is_empty() {
            if !closed.is_empty() {
                self.prompter.say("All restaurants here are closed!")?;
            }
        } else {
            self.prompter.say("You should eat at:")?;
            if let Some(place) = self.offer_bucket(open)? {
                return Ok(Some(place));
            }
        }

        if closed.is_empty()
            || !self
                .prompter
                .ask_yes_no("Include closed locations in results? (y/n): ")?
        {
            return Ok(None);
        }

        self.prompter.say("How about:")?;
        self.offer_bucket(closed)
    }

    /// Present candidates in order; each is consumed when shown so it is
    /// never offered twice.
    fn offer_bucket(&mut self, bucket: Vec<PlaceRecord>) -> Result<Option<PlaceRecord>> {
        let mut remaining = bucket.into_iter().peekable();
        while let Some(place) = remaining.next() {
            self.prompter.present(&place)?;
            if self.prompter.confirm_selection(&place)? {
                return Ok(Some(place));
            }
            tracing::debug!(place_id = %place.place_id, "place rejected");
            if remaining.peek().is_some() {
                self.prompter.say("\nUnfortunate! How about:")?;
            }
        }
        Ok(None)
    }
}
