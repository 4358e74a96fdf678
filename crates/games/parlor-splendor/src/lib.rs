pub mod cards;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// The six mineral kinds. `Gold` is the wild and only ever enters a
/// player's pile through reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mine {
    Copper,
    Diamond,
    Emerald,
    Iron,
    Netherite,
    Gold,
}

impl Mine {
    pub fn index(self) -> usize {
        match self {
            Self::Copper => 0,
            Self::Diamond => 1,
            Self::Emerald => 2,
            Self::Iron => 3,
            Self::Netherite => 4,
            Self::Gold => 5,
        }
    }

    pub fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(Self::Copper),
            1 => Some(Self::Diamond),
            2 => Some(Self::Emerald),
            3 => Some(Self::Iron),
            4 => Some(Self::Netherite),
            5 => Some(Self::Gold),
            _ => None,
        }
    }
}

/// A development card. `costs` and per-color counts are indexed by the
/// first five `Mine` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coupon {
    pub reputation: i32,
    pub costs: [u8; 5],
    pub kind: Mine,
    pub tier: u8,
    pub idx: u32,
}

/// An end-game goal card, granted when a player's owned-card color counts
/// meet its condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    pub reputation: i32,
    pub condition: [u8; 5],
    pub idx: u32,
    pub owner: Option<i64>,
}

/// What the seat is allowed to do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Waiting,
    Action,
    NeedReturnMineral,
    /// Declared for the wire model; the engine assigns goals itself and
    /// never parks a seat here.
    ChooseGoal,
}

/// Per-seat state.
#[derive(Debug, Clone)]
pub struct PlayerState {
    id: i64,
    coupons: Vec<Coupon>,
    reserved: Vec<Coupon>,
    bonus: [u8; 5],
    minerals: [u8; 6],
    reputation: i32,
    phase: Phase,
}

impl PlayerState {
    fn new(id: i64) -> Self {
        Self {
            id,
            coupons: Vec::new(),
            reserved: Vec::new(),
            bonus: [0; 5],
            minerals: [0; 6],
            reputation: 0,
            phase: Phase::Waiting,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn reputation(&self) -> i32 {
        self.reputation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn total_minerals(&self) -> u32 {
        self.minerals.iter().map(|&n| n as u32).sum()
    }
}

const HOLD_LIMIT: u32 = 10;
const RESERVE_LIMIT: usize = 3;
const WIN_REPUTATION: i32 = 14;

/// The table: bank, three face-up rows with their decks, the goal row and
/// the seats in turn order.
#[derive(Debug, Clone)]
pub struct Splendor {
    bank: [u8; 6],
    face_up: [[Option<Coupon>; 4]; 3],
    decks: [Vec<Coupon>; 3],
    goals: Vec<Goal>,
    players: Vec<PlayerState>,
    turn: usize,
}

impl Splendor {
    /// Set the table for the given seats (2-4), in seat order. A random
    /// seat opens.
    pub fn new(player_ids: Vec<i64>) -> Self {
        let mut rng = rand::rng();

        let per_pile: u8 = match player_ids.len() {
            2 => 4,
            3 => 5,
            _ => 7,
        };
        let mut bank = [per_pile; 6];
        bank[Mine::Gold.index()] = 5;

        let mut pool = cards::goal_pool();
        pool.shuffle(&mut rng);
        pool.truncate(player_ids.len() + 1);

        let mut decks = [cards::tier1(), cards::tier2(), cards::tier3()];
        let mut face_up: [[Option<Coupon>; 4]; 3] = Default::default();
        for (tier, deck) in decks.iter_mut().enumerate() {
            deck.shuffle(&mut rng);
            for slot in &mut face_up[tier] {
                *slot = deck.pop();
            }
        }

        let mut players: Vec<PlayerState> =
            player_ids.into_iter().map(PlayerState::new).collect();
        let turn = rng.random_range(0..players.len());
        players[turn].phase = Phase::Action;

        Self {
            bank,
            face_up,
            decks,
            goals: pool,
            players,
            turn,
        }
    }

    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    pub fn bank(&self) -> &[u8; 6] {
        &self.bank
    }

    fn player_index(&self, id: i64) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    fn advance_turn(&mut self) {
        self.players[self.turn].phase = Phase::Waiting;
        self.turn = (self.turn + 1) % self.players.len();
        self.players[self.turn].phase = Phase::Action;
    }

    /// After a take or reserve: hold the turn open for returns when the
    /// seat is over the limit, otherwise pass it on.
    fn settle_overflow(&mut self, idx: usize) {
        if self.players[idx].total_minerals() > HOLD_LIMIT {
            self.players[idx].phase = Phase::NeedReturnMineral;
        } else {
            self.advance_turn();
        }
    }

    /// Take three distinct non-wild minerals, one each.
    pub fn take_3(&mut self, mines: [Mine; 3], player: i64) -> bool {
        let Some(idx) = self.player_index(player) else {
            return false;
        };
        if self.players[idx].phase != Phase::Action {
            return false;
        }
        if mines[0] == mines[1] || mines[1] == mines[2] || mines[2] == mines[0] {
            return false;
        }
        if mines.iter().any(|&m| m == Mine::Gold) {
            return false;
        }
        if mines.iter().any(|&m| self.bank[m.index()] == 0) {
            return false;
        }

        for mine in mines {
            self.bank[mine.index()] -= 1;
            self.players[idx].minerals[mine.index()] += 1;
        }
        self.settle_overflow(idx);
        true
    }

    /// Take two of one non-wild mineral; its pile must hold at least four.
    pub fn take_2(&mut self, mine: Mine, player: i64) -> bool {
        let Some(idx) = self.player_index(player) else {
            return false;
        };
        if self.players[idx].phase != Phase::Action {
            return false;
        }
        if mine == Mine::Gold || self.bank[mine.index()] < 4 {
            return false;
        }

        self.bank[mine.index()] -= 2;
        self.players[idx].minerals[mine.index()] += 2;
        self.settle_overflow(idx);
        true
    }

    /// Pull a face-up slot matching `coupon_idx`, leaving its refill (or an
    /// empty slot) behind.
    fn take_face_up(&mut self, coupon_idx: u32) -> Option<Coupon> {
        for (tier, row) in self.face_up.iter_mut().enumerate() {
            for slot in row.iter_mut() {
                if slot.map(|c| c.idx) == Some(coupon_idx) {
                    let card = slot.take();
                    *slot = self.decks[tier].pop();
                    return card;
                }
            }
        }
        None
    }

    /// Reserve a face-up card (at most three held back), gaining one wild
    /// if the bank has any.
    pub fn reserve(&mut self, coupon_idx: u32, player: i64) -> bool {
        let Some(idx) = self.player_index(player) else {
            return false;
        };
        if self.players[idx].phase != Phase::Action {
            return false;
        }
        if self.players[idx].reserved.len() >= RESERVE_LIMIT {
            return false;
        }
        let Some(card) = self.take_face_up(coupon_idx) else {
            return false;
        };

        self.players[idx].reserved.push(card);
        if self.bank[Mine::Gold.index()] > 0 {
            self.bank[Mine::Gold.index()] -= 1;
            self.players[idx].minerals[Mine::Gold.index()] += 1;
        }
        self.settle_overflow(idx);
        true
    }

    fn can_afford(player: &PlayerState, card: &Coupon) -> bool {
        let mut gold = player.minerals[Mine::Gold.index()] as i32;
        for m in 0..5 {
            let have = player.minerals[m] as i32 + player.bonus[m] as i32;
            let cost = card.costs[m] as i32;
            if have + gold < cost {
                return false;
            }
            gold -= (cost - have).max(0);
        }
        true
    }

    /// Move the payment for `card` from the seat back to the bank. Owned
    /// bonuses discount each color; wilds cover any remaining shortfall.
    fn pay(&mut self, idx: usize, card: &Coupon) {
        for m in 0..5 {
            let cost = card.costs[m] as i32 - self.players[idx].bonus[m] as i32;
            if cost <= 0 {
                continue;
            }
            let from_pile = cost.min(self.players[idx].minerals[m] as i32);
            let shortfall = cost - from_pile;
            self.players[idx].minerals[m] -= from_pile as u8;
            self.bank[m] += from_pile as u8;
            if shortfall > 0 {
                self.players[idx].minerals[Mine::Gold.index()] -= shortfall as u8;
                self.bank[Mine::Gold.index()] += shortfall as u8;
            }
        }
    }

    fn settle_purchase(&mut self, idx: usize, card: Coupon) {
        self.players[idx].coupons.push(card);
        self.players[idx].bonus[card.kind.index()] += 1;
        self.players[idx].reputation += card.reputation;
        self.advance_turn();
        self.assign_goals();
    }

    /// Buy a face-up card.
    pub fn buy(&mut self, coupon_idx: u32, player: i64) -> bool {
        let Some(idx) = self.player_index(player) else {
            return false;
        };
        if self.players[idx].phase != Phase::Action {
            return false;
        }
        let Some(card) = self
            .face_up
            .iter()
            .flatten()
            .flatten()
            .find(|c| c.idx == coupon_idx)
            .copied()
        else {
            return false;
        };
        if !Self::can_afford(&self.players[idx], &card) {
            return false;
        }

        self.pay(idx, &card);
        let card = self
            .take_face_up(coupon_idx)
            .expect("slot located before payment");
        self.settle_purchase(idx, card);
        true
    }

    /// Buy one of the seat's own reserved cards.
    pub fn buy_reserved(&mut self, coupon_idx: u32, player: i64) -> bool {
        let Some(idx) = self.player_index(player) else {
            return false;
        };
        if self.players[idx].phase != Phase::Action {
            return false;
        }
        let Some(pos) = self.players[idx]
            .reserved
            .iter()
            .position(|c| c.idx == coupon_idx)
        else {
            return false;
        };
        let card = self.players[idx].reserved[pos];
        if !Self::can_afford(&self.players[idx], &card) {
            return false;
        }

        self.pay(idx, &card);
        self.players[idx].reserved.remove(pos);
        self.settle_purchase(idx, card);
        true
    }

    /// Give one mineral back to the bank; the turn passes once the seat is
    /// back at the holding limit.
    pub fn return_mine(&mut self, mine: Mine, player: i64) -> bool {
        let Some(idx) = self.player_index(player) else {
            return false;
        };
        if self.players[idx].phase != Phase::NeedReturnMineral {
            return false;
        }
        if self.players[idx].minerals[mine.index()] == 0 {
            return false;
        }

        self.players[idx].minerals[mine.index()] -= 1;
        self.bank[mine.index()] += 1;
        if self.players[idx].total_minerals() <= HOLD_LIMIT {
            self.advance_turn();
        }
        true
    }

    /// Hand out unowned goals to the first qualifying seat. Goals are
    /// scanned in the order they were drawn, seats in seat order; a seat
    /// may take several in one scan.
    fn assign_goals(&mut self) {
        for goal in &mut self.goals {
            if goal.owner.is_some() {
                continue;
            }
            for player in &mut self.players {
                let qualifies = (0..5).all(|c| player.bonus[c] >= goal.condition[c]);
                if qualifies {
                    goal.owner = Some(player.id);
                    player.reputation += goal.reputation;
                    break;
                }
            }
        }
    }

    /// First seat past the reputation threshold, in seat order.
    pub fn check_winner(&self) -> Option<i64> {
        self.players
            .iter()
            .find(|p| p.reputation > WIN_REPUTATION)
            .map(|p| p.id)
    }

    fn slot_view(slot: &Option<Coupon>) -> Value {
        match slot {
            None => json!({ "type": "EMPTY" }),
            Some(card) => json!({
                "reputation": card.reputation,
                "costs": card.costs,
                "type": card.kind.index(),
                "level": card.tier,
                "idx": card.idx,
            }),
        }
    }

    fn player_view(player: &PlayerState) -> Value {
        json!({
            "id": player.id,
            "coupons": player
                .coupons
                .iter()
                .map(|c| Self::slot_view(&Some(*c)))
                .collect::<Vec<_>>(),
            "reserved_coupons": player
                .reserved
                .iter()
                .map(|c| Self::slot_view(&Some(*c)))
                .collect::<Vec<_>>(),
            "coupon_count": player.bonus,
            "mine_count": player.minerals,
            "reputation": player.reputation,
            "status": player.phase,
        })
    }

    /// The shared table snapshot. The room layer adds display names and a
    /// per-receiver `player_info`.
    pub fn game_info(&self) -> Value {
        json!({
            "allies": self
                .goals
                .iter()
                .map(|goal| json!({
                    "reputation": goal.reputation,
                    "condition": goal.condition,
                    "idx": goal.idx,
                    "is_owned": goal.owner.is_some(),
                    "owner_id": goal.owner.unwrap_or(0),
                }))
                .collect::<Vec<_>>(),
            "coupon_lv1": self.face_up[0].iter().map(Self::slot_view).collect::<Vec<_>>(),
            "coupon_lv2": self.face_up[1].iter().map(Self::slot_view).collect::<Vec<_>>(),
            "coupon_lv3": self.face_up[2].iter().map(Self::slot_view).collect::<Vec<_>>(),
            "bank": self.bank,
            "players": self.players.iter().map(Self::player_view).collect::<Vec<_>>(),
        })
    }

    /// One seat's private snapshot.
    pub fn player_info(&self, player: i64) -> Option<Value> {
        let idx = self.player_index(player)?;
        Some(Self::player_view(&self.players[idx]))
    }
}
