use {
    crate::{
        search::{InformedSearch, SearchError, SearchOptions},
        Parse, UPPERCASE_A_OFFSET,
    },
    derive_deref::Deref,
    nom::{
        branch::alt,
        bytes::complete::tag,
        character::complete::{alpha1, line_ending},
        combinator::{map, opt},
        error::{Error, ErrorKind},
        multi::separated_list1,
        sequence::{delimited, tuple},
        Err, IResult,
    },
    static_assertions::const_assert,
    std::fmt::{Display, Formatter, Result as FmtResult},
    strum::{EnumCount, EnumIter, IntoEnumIterator},
};

/* A building of stacked floors holds a fixed collection of items, and a single-cabin elevator
moves one or two of them at a time between adjacent floors. Items come in matched category pairs:
a carrier (a generator, in the input's vocabulary) and a payload (a microchip). A payload sharing
a floor with any carrier is only safe when its own category's carrier is on that floor too; a
configuration exposing an unprotected payload that way is never entered. The task is the minimal
number of elevator moves that brings every item to the top floor. */

/// Glyph letters cap how many categories one building can hold.
const MAX_CATEGORIES: usize = 26_usize;

#[derive(Clone, Copy, Debug, EnumCount, EnumIter, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum ItemKind {
    Carrier,
    Payload,
}

// Sorted floors keep carriers ahead of payloads; `Floor::carrier_count` relies on this split
const_assert!(ItemKind::COUNT == 2_usize);

impl ItemKind {
    const GLYPHS: [char; Self::COUNT] = ['G', 'M'];

    pub const fn glyph(self) -> char {
        Self::GLYPHS[self as usize]
    }
}

/// One physical item: a category identifier plus which half of the pair it is. Two items of the
/// same category and kind are indistinguishable but still move independently.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Item {
    pub kind: ItemKind,
    pub category: u8,
}

impl Item {
    pub const fn carrier(category: u8) -> Self {
        Self {
            kind: ItemKind::Carrier,
            category,
        }
    }

    pub const fn payload(category: u8) -> Self {
        Self {
            kind: ItemKind::Payload,
            category,
        }
    }
}

/// The items on one floor, kept sorted so that equal contents compare and hash equal no matter
/// the order they arrived in.
#[derive(Clone, Debug, Default, Deref, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Floor(Vec<Item>);

impl Floor {
    fn carrier_count(&self) -> usize {
        self.0
            .partition_point(|item| item.kind == ItemKind::Carrier)
    }

    fn payloads(&self) -> &[Item] {
        &self.0[self.carrier_count()..]
    }

    fn contains(&self, item: Item) -> bool {
        self.0.binary_search(&item).is_ok()
    }
}

impl From<Vec<Item>> for Floor {
    fn from(mut items: Vec<Item>) -> Self {
        items.sort_unstable();

        Self(items)
    }
}

/// One immutable configuration: the elevator position plus the item placement per floor. Floor
/// indices are zero-based from the bottom.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct State {
    position: u8,
    floors: Vec<Floor>,
}

impl State {
    pub fn new(position: u8, floors: Vec<Floor>) -> Self {
        Self { position, floors }
    }

    pub fn position(&self) -> u8 {
        self.position
    }

    pub fn floors(&self) -> &[Floor] {
        &self.floors
    }

    fn top_floor(&self) -> u8 {
        self.floors.len() as u8 - 1_u8
    }

    /// All items are on the top floor, and so is the elevator.
    pub fn is_goal(&self) -> bool {
        self.position == self.top_floor()
            && self.floors[..self.top_floor() as usize]
                .iter()
                .all(|floor| floor.is_empty())
    }

    /// No floor holding a carrier also holds a payload whose matching carrier is elsewhere.
    pub fn is_valid(&self) -> bool {
        self.floors.iter().all(|floor| {
            floor.carrier_count() == 0_usize
                || floor
                    .payloads()
                    .iter()
                    .all(|payload| floor.contains(Item::carrier(payload.category)))
        })
    }

    /// Rejects configurations that must not enter a search: an empty building, an elevator
    /// position outside it, or a placement already violating the floor safety rule.
    pub fn check_instance(&self) -> Result<(), SearchError> {
        if self.floors.is_empty() {
            Err(SearchError::InvalidInstance(
                "a building needs at least one floor".into(),
            ))
        } else if self.position > self.top_floor() {
            Err(SearchError::InvalidInstance(format!(
                "the elevator is on floor {} of a {}-floor building",
                self.position as usize + 1_usize,
                self.floors.len()
            )))
        } else if !self.is_valid() {
            Err(SearchError::InvalidInstance(
                "a payload shares a floor with foreign carriers but not its own".into(),
            ))
        } else {
            Ok(())
        }
    }

    fn adjacent_floors(&self) -> impl Iterator<Item = u8> {
        let position: u8 = self.position;
        let top_floor: u8 = self.top_floor();

        (position > 0_u8)
            .then(|| position - 1_u8)
            .into_iter()
            .chain((position < top_floor).then(|| position + 1_u8))
    }

    /// Fills `neighbors` with every valid configuration one elevator move away: each single item
    /// and each unordered pair of items on the elevator floor, carried one floor up or down.
    pub fn neighbors(&self, neighbors: &mut Vec<Self>) {
        neighbors.clear();

        let here_len: usize = self.floors[self.position as usize].len();

        for destination in self.adjacent_floors() {
            for first in 0_usize..here_len {
                self.push_move_if_valid(neighbors, destination, first, None);

                for second in first + 1_usize..here_len {
                    self.push_move_if_valid(neighbors, destination, first, Some(second));
                }
            }
        }
    }

    fn push_move_if_valid(
        &self,
        neighbors: &mut Vec<Self>,
        destination: u8,
        first: usize,
        second: Option<usize>,
    ) {
        let mut floors: Vec<Floor> = self.floors.clone();
        let source: &mut Vec<Item> = &mut floors[self.position as usize].0;

        // Remove the higher index first so the lower one stays in place
        let second_item: Option<Item> = second.map(|second| source.remove(second));
        let first_item: Item = source.remove(first);
        let target: &mut Vec<Item> = &mut floors[destination as usize].0;

        target.push(first_item);
        target.extend(second_item);
        target.sort_unstable();

        let candidate: Self = Self {
            position: destination,
            floors,
        };

        if candidate.is_valid() {
            neighbors.push(candidate);
        }
    }

    /// A lower bound on the moves still needed, zero exactly at the goal.
    ///
    /// Two bounds are taken and the larger wins. Every item below the top floor needs one floor
    /// crossing per floor of distance, and a move lifts at most two items one floor, so half the
    /// summed crossings (rounded up) is one bound. The elevator itself still has to reach the
    /// lowest occupied floor and then the top, which is the other. Both change by at most one per
    /// move, which keeps the estimate consistent and the first goal popped optimal.
    pub fn estimated_moves_to_goal(&self) -> u32 {
        let top_floor: u32 = self.top_floor() as u32;
        let mut lifts: u32 = 0_u32;
        let mut lowest_occupied: Option<u32> = None;

        for (floor_index, floor) in self.floors.iter().enumerate() {
            let floor_index: u32 = floor_index as u32;

            if floor_index < top_floor && !floor.is_empty() {
                lifts += (top_floor - floor_index) * floor.len() as u32;
                lowest_occupied.get_or_insert(floor_index);
            }
        }

        let lift_moves: u32 = (lifts + 1_u32) / 2_u32;
        let elevator_moves: u32 = lowest_occupied.map_or(0_u32, |lowest_occupied| {
            (self.position as u32).abs_diff(lowest_occupied) + (top_floor - lowest_occupied)
        });

        lift_moves.max(elevator_moves)
    }

    #[cfg(test)]
    fn universe(&self) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .floors
            .iter()
            .flat_map(|floor| floor.iter().copied())
            .collect();

        items.sort_unstable();

        items
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let category_count: u8 = self
            .floors
            .iter()
            .flat_map(|floor| floor.iter())
            .map(|item| item.category + 1_u8)
            .max()
            .unwrap_or(0_u8);

        for floor_index in (0_u8..=self.top_floor()).rev() {
            write!(
                f,
                "F{} {}  ",
                floor_index + 1_u8,
                if self.position == floor_index {
                    'E'
                } else {
                    '.'
                }
            )?;

            let floor: &Floor = &self.floors[floor_index as usize];

            for category in 0_u8..category_count {
                let letter: char = (UPPERCASE_A_OFFSET + category) as char;

                for kind in ItemKind::iter() {
                    if floor.contains(Item { kind, category }) {
                        write!(f, "{}{} ", letter, kind.glyph())?;
                    } else {
                        write!(f, ".  ")?;
                    }
                }
            }

            writeln!(f)?;
        }

        Ok(())
    }
}

struct FewestMovesFinder {
    start: State,
}

impl InformedSearch for FewestMovesFinder {
    type Vertex = State;
    type Cost = u32;

    fn start(&self) -> &Self::Vertex {
        &self.start
    }

    fn is_goal(&self, vertex: &Self::Vertex) -> bool {
        vertex.is_goal()
    }

    fn heuristic(&self, vertex: &Self::Vertex) -> Self::Cost {
        vertex.estimated_moves_to_goal()
    }

    fn neighbors(&self, vertex: &Self::Vertex, neighbors: &mut Vec<Self::Vertex>) {
        vertex.neighbors(neighbors);
    }

    fn validate(&self) -> Result<(), SearchError> {
        self.start.check_instance()
    }
}

fn parse_item_phrase<'i>(input: &'i str) -> IResult<&'i str, (&'i str, ItemKind)> {
    alt((
        map(delimited(tag("a "), alpha1, tag(" generator")), |name| {
            (name, ItemKind::Carrier)
        }),
        map(
            delimited(tag("a "), alpha1, tag("-compatible microchip")),
            |name| (name, ItemKind::Payload),
        ),
    ))(input)
}

#[cfg_attr(test, derive(Debug, PartialEq))]
pub struct Solution {
    start: State,
}

impl Solution {
    const FLOOR_ORDINALS: [&'static str; 4_usize] = ["first", "second", "third", "fourth"];

    pub fn new(start: State) -> Self {
        Self { start }
    }

    pub fn start(&self) -> &State {
        &self.start
    }

    /// The minimal number of elevator moves bringing every item to the top floor.
    pub fn fewest_moves(&self) -> Result<u32, SearchError> {
        self.fewest_moves_with_options(&SearchOptions::default())
    }

    pub fn fewest_moves_with_options(&self, options: &SearchOptions) -> Result<u32, SearchError> {
        FewestMovesFinder {
            start: self.start.clone(),
        }
        .run_a_star_with_options(options)
    }
}

impl Parse for Solution {
    fn parse<'i>(input: &'i str) -> IResult<&'i str, Self> {
        let mut input: &str = input;
        let mut categories: Vec<&'i str> = Vec::new();
        let mut floors: Vec<Floor> = Vec::with_capacity(Self::FLOOR_ORDINALS.len());

        for ordinal in Self::FLOOR_ORDINALS {
            let (next_input, phrases): (&str, Vec<(&str, ItemKind)>) = delimited(
                tuple((tag("The "), tag(ordinal), tag(" floor contains "))),
                alt((
                    map(tag("nothing relevant"), |_| Vec::new()),
                    separated_list1(
                        alt((tag(", and "), tag(", "), tag(" and "))),
                        parse_item_phrase,
                    ),
                )),
                tuple((tag("."), opt(line_ending))),
            )(input)?;

            let mut items: Vec<Item> = Vec::with_capacity(phrases.len());

            for (name, kind) in phrases {
                let category: usize = categories
                    .iter()
                    .position(|category| *category == name)
                    .unwrap_or_else(|| {
                        categories.push(name);

                        categories.len() - 1_usize
                    });

                if category >= MAX_CATEGORIES {
                    return Err(Err::Failure(Error::new(input, ErrorKind::TooLarge)));
                }

                items.push(Item {
                    kind,
                    category: category as u8,
                });
            }

            floors.push(items.into());
            input = next_input;
        }

        Ok((
            input,
            Self {
                start: State::new(0_u8, floors),
            },
        ))
    }
}

impl<'i> TryFrom<&'i str> for Solution {
    type Error = Err<Error<&'i str>>;

    fn try_from(input: &'i str) -> Result<Self, Self::Error> {
        Ok(Self::parse(input)?.1)
    }
}
