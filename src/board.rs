//! The card containers of a day page and the rules for mutating them.
//!
//! A [`Board`] holds one read-only library of concept cards and any number of
//! slot containers keyed by timeframe. The drag provider owns gesture
//! recognition; it reports finished gestures as [`DragEvent`]s and the board
//! applies them:
//!
//! - a drop from the library **copies** the card into the destination slot,
//!   leaving the library untouched;
//! - a drop from a slot **moves** the existing card, note included;
//! - a reorder inside a slot repositions the card.
//!
//! Every slot card is built together with its [`RemoveControl`], so a card in
//! a slot can always be removed. Library cards have no removal control at all.
//!
//! Events that break a container's options (dropping into the library,
//! reordering the library, exchanging cards across groups) are rejected with a
//! [`BoardError`] and leave every container as it was.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Concept, DayView};

/// Group name shared by the library and every slot on a day page.
pub const DEFAULT_GROUP: &str = "concepts";
/// Selector of the element a card is dragged by.
pub const DEFAULT_HANDLE: &str = ".drag-handle";

/// Identity of one card element on the board.
///
/// Keys are never reused, so a removal control keeps pointing at the card it
/// was built for even after that card has moved between slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardKey(u64);

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "card-{}", self.0)
    }
}

/// Address of a container on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContainerId {
    Library,
    Slot(String),
}

impl ContainerId {
    pub fn slot(timeframe: impl Into<String>) -> Self {
        Self::Slot(timeframe.into())
    }

    /// The timeframe key of a slot container, `None` for the library.
    pub fn timeframe(&self) -> Option<&str> {
        match self {
            Self::Library => None,
            Self::Slot(tf) => Some(tf),
        }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Library => f.write_str("library"),
            Self::Slot(tf) => write!(f, "slot '{}'", tf),
        }
    }
}

/// What happens to a card when it is dragged out of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullMode {
    /// The source keeps its card; the destination receives a copy.
    Clone,
    /// The card leaves the source.
    Move,
}

/// Per-container configuration handed to the drag provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerOptions {
    /// Containers sharing a group can exchange cards.
    pub group: String,
    pub pull: PullMode,
    /// Whether cards may be dropped into this container.
    pub put: bool,
    /// Whether cards may be reordered inside this container.
    pub sort: bool,
    pub handle: String,
}

impl ContainerOptions {
    pub fn library(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            pull: PullMode::Clone,
            put: false,
            sort: false,
            handle: DEFAULT_HANDLE.to_string(),
        }
    }

    pub fn slot(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            pull: PullMode::Move,
            put: true,
            sort: true,
            handle: DEFAULT_HANDLE.to_string(),
        }
    }
}

/// A concept card in the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryCard {
    concept_ref: String,
    label: String,
}

impl LibraryCard {
    /// `concept_ref` is the identifier text recorded on the card. It is kept
    /// verbatim and only parsed when a snapshot is taken.
    pub fn new(concept_ref: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            concept_ref: concept_ref.into(),
            label: label.into(),
        }
    }

    pub fn concept_ref(&self) -> &str {
        &self.concept_ref
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl From<&Concept> for LibraryCard {
    fn from(concept: &Concept) -> Self {
        Self::new(concept.id.to_string(), concept.name.clone())
    }
}

/// The removal affordance of a slot card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveControl {
    target: CardKey,
}

impl RemoveControl {
    /// The card this control removes.
    pub fn target(&self) -> CardKey {
        self.target
    }
}

/// A card inside a slot container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotCard {
    key: CardKey,
    concept_ref: String,
    label: String,
    note: Option<String>,
    remove: RemoveControl,
}

impl SlotCard {
    fn new(key: CardKey, concept_ref: String, label: String, note: Option<String>) -> Self {
        Self {
            key,
            concept_ref,
            label,
            note,
            remove: RemoveControl { target: key },
        }
    }

    pub fn key(&self) -> CardKey {
        self.key
    }

    pub fn concept_ref(&self) -> &str {
        &self.concept_ref
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Current text of the note field, if the card has one.
    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn remove_control(&self) -> &RemoveControl {
        &self.remove
    }
}

/// A named slot and its cards, top to bottom.
#[derive(Debug, Clone)]
pub struct SlotContainer {
    timeframe: String,
    options: ContainerOptions,
    cards: Vec<SlotCard>,
}

impl SlotContainer {
    pub fn timeframe(&self) -> &str {
        &self.timeframe
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    pub fn cards(&self) -> &[SlotCard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// A finished gesture reported by the drag provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    /// A card was dropped into `to` at `new_index`, coming from `from` at
    /// `old_index`.
    Added {
        from: ContainerId,
        old_index: usize,
        to: ContainerId,
        new_index: usize,
    },
    /// A card changed position inside one container. `new_index` is its
    /// index in the resulting order.
    Reordered {
        container: ContainerId,
        old_index: usize,
        new_index: usize,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("Unknown container: {0}")]
    UnknownContainer(ContainerId),

    #[error("Slot '{0}' already exists")]
    DuplicateTimeframe(String),

    #[error("{0} does not accept drops")]
    DropRejected(ContainerId),

    #[error("{0} cannot be reordered")]
    SortRejected(ContainerId),

    #[error("{from} and {to} are in different groups")]
    GroupMismatch { from: ContainerId, to: ContainerId },

    #[error("Index {index} out of range for {container} ({len} cards)")]
    IndexOutOfRange {
        container: ContainerId,
        index: usize,
        len: usize,
    },

    #[error("Card {0} not found")]
    CardNotFound(CardKey),
}

/// The library and slot containers of one day page.
#[derive(Debug, Clone)]
pub struct Board {
    library_options: ContainerOptions,
    library: Vec<LibraryCard>,
    slots: Vec<SlotContainer>,
    next_key: u64,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self::with_group(DEFAULT_GROUP)
    }

    /// Create an empty board whose containers share `group`.
    pub fn with_group(group: impl Into<String>) -> Self {
        Self {
            library_options: ContainerOptions::library(group),
            library: Vec::new(),
            slots: Vec::new(),
            next_key: 0,
        }
    }

    /// Build a board from a day view: the active concepts become the library
    /// and every timeframe becomes a slot pre-populated with its saved items.
    pub fn from_day_view(view: &DayView) -> Self {
        let mut board = Self::new();
        for concept in &view.concepts {
            board.add_library_card(concept.into());
        }
        for slot in &view.slots {
            let timeframe = slot.timeframe.as_str().to_string();
            let cards = slot
                .items
                .iter()
                .map(|item| {
                    let key = board.mint_key();
                    SlotCard::new(
                        key,
                        item.concept_id.to_string(),
                        item.concept_name.clone(),
                        Some(item.note.clone()),
                    )
                })
                .collect();
            board.slots.push(SlotContainer {
                options: ContainerOptions::slot(board.library_options.group.clone()),
                timeframe,
                cards,
            });
        }
        board
    }

    pub fn add_library_card(&mut self, card: LibraryCard) {
        self.library.push(card);
    }

    /// Register an empty slot container. Timeframes must be unique.
    pub fn add_slot(&mut self, timeframe: impl Into<String>) -> Result<(), BoardError> {
        let timeframe = timeframe.into();
        if self.slot(&timeframe).is_some() {
            return Err(BoardError::DuplicateTimeframe(timeframe));
        }
        self.slots.push(SlotContainer {
            timeframe,
            options: ContainerOptions::slot(self.library_options.group.clone()),
            cards: Vec::new(),
        });
        Ok(())
    }

    /// Append an already-saved placement to a slot, as rendered at load time.
    pub fn place(
        &mut self,
        timeframe: &str,
        concept_ref: impl Into<String>,
        label: impl Into<String>,
        note: Option<String>,
    ) -> Result<CardKey, BoardError> {
        let key = CardKey(self.next_key);
        let slot = self
            .slot_mut(timeframe)
            .ok_or_else(|| BoardError::UnknownContainer(ContainerId::slot(timeframe)))?;
        slot.cards
            .push(SlotCard::new(key, concept_ref.into(), label.into(), note));
        self.next_key += 1;
        Ok(key)
    }

    pub fn library(&self) -> &[LibraryCard] {
        &self.library
    }

    pub fn library_options(&self) -> &ContainerOptions {
        &self.library_options
    }

    /// Slot containers in the order they were registered.
    pub fn slots(&self) -> &[SlotContainer] {
        &self.slots
    }

    pub fn slot(&self, timeframe: &str) -> Option<&SlotContainer> {
        self.slots.iter().find(|s| s.timeframe == timeframe)
    }

    pub fn options(&self, container: &ContainerId) -> Option<&ContainerOptions> {
        match container {
            ContainerId::Library => Some(&self.library_options),
            ContainerId::Slot(tf) => self.slot(tf).map(|s| &s.options),
        }
    }

    /// Find a card and the slot that currently holds it.
    pub fn card(&self, key: CardKey) -> Option<(&SlotContainer, &SlotCard)> {
        self.slots
            .iter()
            .find_map(|slot| slot.cards.iter().find(|c| c.key == key).map(|c| (slot, c)))
    }

    /// Apply a drag provider notification. Returns the key of the card that
    /// ended up at the reported position.
    pub fn apply(&mut self, event: DragEvent) -> Result<CardKey, BoardError> {
        tracing::debug!(?event, "Applying drag event");
        let result = match event {
            DragEvent::Added {
                from,
                old_index,
                to,
                new_index,
            } => self.drop_card(from, old_index, to, new_index),
            DragEvent::Reordered {
                container,
                old_index,
                new_index,
            } => self.reorder(container, old_index, new_index),
        };
        if let Err(ref e) = result {
            tracing::warn!("Drag event rejected: {}", e);
        }
        result
    }

    /// Remove a card from whichever slot holds it. Removal is final.
    pub fn remove(&mut self, key: CardKey) -> Result<SlotCard, BoardError> {
        for slot in &mut self.slots {
            if let Some(index) = slot.cards.iter().position(|c| c.key == key) {
                tracing::debug!(%key, timeframe = %slot.timeframe, "Removed card");
                return Ok(slot.cards.remove(index));
            }
        }
        Err(BoardError::CardNotFound(key))
    }

    /// The user activated a removal control.
    pub fn activate(&mut self, control: RemoveControl) -> Result<SlotCard, BoardError> {
        self.remove(control.target)
    }

    /// Replace the note text of a slot card.
    pub fn set_note(&mut self, key: CardKey, note: impl Into<String>) -> Result<(), BoardError> {
        let card = self
            .slots
            .iter_mut()
            .flat_map(|s| s.cards.iter_mut())
            .find(|c| c.key == key)
            .ok_or(BoardError::CardNotFound(key))?;
        card.note = Some(note.into());
        Ok(())
    }

    /// Every slot card carries exactly one removal control, aimed at itself,
    /// and no two cards share a key.
    pub fn removal_controls_intact(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.slots
            .iter()
            .flat_map(|s| s.cards.iter())
            .all(|c| c.remove.target == c.key && seen.insert(c.key))
    }

    fn drop_card(
        &mut self,
        from: ContainerId,
        old_index: usize,
        to: ContainerId,
        new_index: usize,
    ) -> Result<CardKey, BoardError> {
        if from == to {
            return self.reorder(to, old_index, new_index);
        }

        let from_options = self
            .options(&from)
            .ok_or_else(|| BoardError::UnknownContainer(from.clone()))?;
        let to_options = self
            .options(&to)
            .ok_or_else(|| BoardError::UnknownContainer(to.clone()))?;

        if !to_options.put {
            return Err(BoardError::DropRejected(to));
        }
        if from_options.group != to_options.group {
            return Err(BoardError::GroupMismatch { from, to });
        }
        let Some(timeframe) = to.timeframe().map(str::to_owned) else {
            return Err(BoardError::DropRejected(to));
        };

        let source_len = self.container_len(&from);
        if old_index >= source_len {
            return Err(BoardError::IndexOutOfRange {
                container: from,
                index: old_index,
                len: source_len,
            });
        }
        let dest_len = self.container_len(&to);
        if new_index > dest_len {
            return Err(BoardError::IndexOutOfRange {
                container: to,
                index: new_index,
                len: dest_len,
            });
        }

        // The library clones out and slots move out.
        let card = match from {
            ContainerId::Library => self.copy_library_card(old_index)?,
            ContainerId::Slot(_) => self.take_card(&from, old_index)?,
        };
        let key = card.key;
        self.slot_mut(&timeframe)
            .ok_or(BoardError::UnknownContainer(to))?
            .cards
            .insert(new_index, card);
        Ok(key)
    }

    fn reorder(
        &mut self,
        container: ContainerId,
        old_index: usize,
        new_index: usize,
    ) -> Result<CardKey, BoardError> {
        let options = self
            .options(&container)
            .ok_or_else(|| BoardError::UnknownContainer(container.clone()))?;
        if !options.sort {
            return Err(BoardError::SortRejected(container));
        }
        let Some(timeframe) = container.timeframe().map(str::to_owned) else {
            return Err(BoardError::SortRejected(container));
        };

        let len = self.container_len(&container);
        for index in [old_index, new_index] {
            if index >= len {
                return Err(BoardError::IndexOutOfRange {
                    container,
                    index,
                    len,
                });
            }
        }

        let slot = self
            .slot_mut(&timeframe)
            .ok_or(BoardError::UnknownContainer(container))?;
        let card = slot.cards.remove(old_index);
        let key = card.key;
        slot.cards.insert(new_index, card);
        Ok(key)
    }

    /// Build a fresh slot card, with an empty note, from a library card.
    fn copy_library_card(&mut self, index: usize) -> Result<SlotCard, BoardError> {
        let card = self
            .library
            .get(index)
            .ok_or_else(|| BoardError::IndexOutOfRange {
                container: ContainerId::Library,
                index,
                len: self.library.len(),
            })?;
        let (concept_ref, label) = (card.concept_ref.clone(), card.label.clone());
        let key = self.mint_key();
        Ok(SlotCard::new(key, concept_ref, label, Some(String::new())))
    }

    /// Detach the card at `index` in a slot.
    fn take_card(&mut self, from: &ContainerId, index: usize) -> Result<SlotCard, BoardError> {
        let slot = from
            .timeframe()
            .and_then(|tf| self.slots.iter_mut().find(|s| s.timeframe == tf))
            .ok_or_else(|| BoardError::DropRejected(from.clone()))?;
        if index >= slot.cards.len() {
            return Err(BoardError::IndexOutOfRange {
                container: from.clone(),
                index,
                len: slot.cards.len(),
            });
        }
        Ok(slot.cards.remove(index))
    }

    fn container_len(&self, container: &ContainerId) -> usize {
        match container {
            ContainerId::Library => self.library.len(),
            ContainerId::Slot(tf) => self.slot(tf).map_or(0, SlotContainer::len),
        }
    }

    fn slot_mut(&mut self, timeframe: &str) -> Option<&mut SlotContainer> {
        self.slots.iter_mut().find(|s| s.timeframe == timeframe)
    }

    fn mint_key(&mut self) -> CardKey {
        let key = CardKey(self.next_key);
        self.next_key += 1;
        key
    }
}
