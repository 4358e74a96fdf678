pub mod card;

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;

pub use card::{Card, CardColor, CardContent};

/// One seat at the table.
#[derive(Debug, Clone)]
pub struct Player {
    user_name: String,
    hand: Vec<Card>,
    /// Hand snapshot taken at the moment a WILD-DRAW-4 was played, used to
    /// settle a later suspect call.
    cards_when_wild_draw_4: Vec<Card>,
    drawn_one: bool,
    last_drew: Option<Card>,
    said_uno: bool,
}

impl Player {
    fn new(user_name: String) -> Self {
        Self {
            user_name,
            hand: Vec::with_capacity(15),
            cards_when_wild_draw_4: Vec::new(),
            drawn_one: false,
            last_drew: None,
            said_uno: false,
        }
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }
}

/// Result of a successful play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayOutcome {
    /// The player went down to one card without saying UNO and was dealt
    /// two penalty cards.
    pub punished: bool,
}

/// Result of a successful draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOutcome {
    pub card: Card,
    /// The player had said UNO but drew instead of playing; two penalty
    /// cards were dealt first.
    pub punished: bool,
}

/// Result of a valid suspect call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspectOutcome {
    /// True when the accused did hold a playable card and draws four;
    /// false when the suspecter draws six and loses the turn.
    pub success: bool,
    pub accused: String,
    /// The accused player's hand after the penalty, revealed to the caller.
    pub accused_cards: Vec<Card>,
}

/// The UNO table state.
///
/// The draw pile and the discard share one rotating queue: draws pop the
/// front, played cards go to the back, and the back element is the upcard.
/// Together with the hands this always partitions the 108-card deck.
#[derive(Debug, Clone)]
pub struct Uno {
    players: Vec<Player>,
    deck: VecDeque<Card>,
    last_color: CardColor,
    last_content: CardContent,
    card_before_wild_draw_4: Option<Card>,
    reversed: bool,
    wait_suspect: bool,
    next_idx: usize,
}

/// The full 108-card composition: per color two of each of 1-9, SKIP,
/// DRAW-2 and REVERSE plus one 0, then four of each wild.
fn full_deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(108);
    let colors = [
        CardColor::Red,
        CardColor::Yellow,
        CardColor::Green,
        CardColor::Blue,
    ];
    let doubled = [
        CardContent::One,
        CardContent::Two,
        CardContent::Three,
        CardContent::Four,
        CardContent::Five,
        CardContent::Six,
        CardContent::Seven,
        CardContent::Eight,
        CardContent::Nine,
        CardContent::Skip,
        CardContent::Draw2,
        CardContent::Reverse,
    ];
    for color in colors {
        for content in doubled {
            cards.push(Card::new(color, content));
            cards.push(Card::new(color, content));
        }
    }
    for color in colors {
        cards.push(Card::new(color, CardContent::Zero));
    }
    for _ in 0..4 {
        cards.push(Card::new(CardColor::Black, CardContent::Wild));
        cards.push(Card::new(CardColor::Black, CardContent::WildDraw4));
    }
    cards
}

impl Uno {
    /// Deal a fresh game: shuffle, seven cards per player, rotate the
    /// upcard until it is a digit, pick a random first player.
    pub fn new(player_names: Vec<String>) -> Self {
        let mut rng = rand::rng();
        let mut cards = full_deck();
        cards.shuffle(&mut rng);

        let mut players: Vec<Player> = player_names.into_iter().map(Player::new).collect();
        let next_idx = rng.random_range(0..players.len());

        let mut deck: VecDeque<Card> = cards.into_iter().collect();
        for player in &mut players {
            for _ in 0..7 {
                let card = deck.pop_front().expect("deck holds enough for the deal");
                player.hand.push(card);
            }
        }

        // A function card must not open the game.
        while !deck.back().expect("deck is never empty").is_number() {
            let front = deck.pop_front().expect("deck is never empty");
            deck.push_back(front);
        }

        let upcard = *deck.back().expect("deck is never empty");
        Self {
            players,
            deck,
            last_color: upcard.color,
            last_content: upcard.content,
            card_before_wild_draw_4: None,
            reversed: false,
            wait_suspect: false,
            next_idx,
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn hand_of(&self, user: &str) -> Option<&[Card]> {
        self.players
            .iter()
            .find(|p| p.user_name == user)
            .map(|p| p.hand.as_slice())
    }

    /// Top of the discard pile.
    pub fn last_card(&self) -> Card {
        *self.deck.back().expect("deck is never empty")
    }

    pub fn next_player(&self) -> &str {
        &self.players[self.next_idx].user_name
    }

    /// Color subsequent plays must match (the chosen color after a wild).
    pub fn specified_color(&self) -> CardColor {
        self.last_color
    }

    pub fn direction(&self) -> bool {
        self.reversed
    }

    pub fn waiting_for_suspect(&self) -> bool {
        self.wait_suspect
    }

    fn advance(&mut self) {
        let n = self.players.len();
        self.next_idx = if self.reversed {
            (self.next_idx + 1) % n
        } else {
            (self.next_idx + n - 1) % n
        };
    }

    /// Seat that acted right before the current one.
    fn previous_idx(&self) -> usize {
        let n = self.players.len();
        if self.reversed {
            (self.next_idx + n - 1) % n
        } else {
            (self.next_idx + 1) % n
        }
    }

    /// Deal `count` cards to a seat, returning the last one dealt. The
    /// upcard itself is never consumed, so a nearly-empty queue truncates
    /// the deal instead of underflowing.
    fn give(&mut self, idx: usize, count: usize) -> Option<Card> {
        let mut last = None;
        for _ in 0..count {
            if self.deck.len() <= 1 {
                break;
            }
            let card = self.deck.pop_front().expect("len checked above");
            self.players[idx].hand.push(card);
            last = Some(card);
        }
        last
    }

    /// Play `card` from `user`'s hand, with `chosen` as the announced color
    /// when the card is a wild. Returns `None` for any illegal play, in
    /// which case no state changed.
    pub fn play(&mut self, user: &str, card: Card, chosen: CardColor) -> Option<PlayOutcome> {
        if self.wait_suspect {
            return None;
        }

        let matches = card.color == CardColor::Black
            || card.color == self.last_color
            || card.content == self.last_content;
        if !matches {
            return None;
        }

        if self.players[self.next_idx].user_name != user {
            return None;
        }
        if card.color == CardColor::Black && chosen == CardColor::Black {
            return None;
        }

        let idx = self.next_idx;
        if !self.players[idx].hand.contains(&card) {
            return None;
        }
        if self.players[idx].drawn_one && self.players[idx].last_drew != Some(card) {
            return None;
        }
        self.players[idx].drawn_one = false;

        if card.content == CardContent::WildDraw4 {
            self.players[idx].cards_when_wild_draw_4 = self.players[idx].hand.clone();
        }

        self.deck.push_back(card);
        let pos = self.players[idx]
            .hand
            .iter()
            .position(|c| *c == card)
            .expect("membership checked above");
        self.players[idx].hand.remove(pos);

        let punished = self.players[idx].hand.len() == 1 && !self.players[idx].said_uno;
        if punished {
            self.give(idx, 2);
        }
        self.players[idx].said_uno = false;

        if card.content == CardContent::Reverse {
            self.reversed = !self.reversed;
        }

        self.advance();

        match card.content {
            CardContent::Draw2 => {
                self.give(self.next_idx, 2);
                self.advance();
            },
            CardContent::Skip => self.advance(),
            CardContent::WildDraw4 => {
                self.wait_suspect = true;
                self.card_before_wild_draw_4 =
                    Some(Card::new(self.last_color, self.last_content));
            },
            _ => {},
        }

        self.last_color = if card.color == CardColor::Black {
            chosen
        } else {
            card.color
        };
        self.last_content = card.content;

        Some(PlayOutcome { punished })
    }

    /// Draw a single card. Legal once per turn, for the current player,
    /// outside a suspect window.
    pub fn draw_one(&mut self, user: &str) -> Option<DrawOutcome> {
        if self.wait_suspect {
            return None;
        }
        if self.players[self.next_idx].user_name != user {
            return None;
        }
        if self.players[self.next_idx].drawn_one {
            return None;
        }

        let idx = self.next_idx;
        let punished = self.players[idx].said_uno;
        // The upcard itself is never drawn; make sure the whole deal fits.
        let needed = if punished { 3 } else { 1 };
        if self.deck.len() <= needed {
            return None;
        }
        if punished {
            self.give(idx, 2);
            self.players[idx].said_uno = false;
        }

        let card = self.give(idx, 1).expect("queue length checked above");
        self.players[idx].drawn_one = true;
        self.players[idx].last_drew = Some(card);
        Some(DrawOutcome { card, punished })
    }

    /// Pass the turn after drawing, instead of playing the drawn card.
    pub fn skip_after_drawing_one(&mut self, user: &str) -> bool {
        if self.wait_suspect {
            return false;
        }
        if self.players[self.next_idx].user_name != user {
            return false;
        }
        if !self.players[self.next_idx].drawn_one {
            return false;
        }
        self.players[self.next_idx].drawn_one = false;
        self.advance();
        true
    }

    /// Announce UNO. Legal only for the current player holding exactly two
    /// cards; any other caller is dealt two penalty cards.
    pub fn say_uno(&mut self, user: &str) -> bool {
        if self.players[self.next_idx].user_name != user {
            if let Some(idx) = self.players.iter().position(|p| p.user_name == user) {
                self.give(idx, 2);
            }
            return false;
        }
        if self.players[self.next_idx].hand.len() != 2 {
            self.give(self.next_idx, 2);
            return false;
        }
        self.players[self.next_idx].said_uno = true;
        true
    }

    /// Challenge the WILD-DRAW-4 just played. Only the player about to
    /// draw may call it, and only while the suspect window is open.
    pub fn suspect(&mut self, user: &str) -> Option<SuspectOutcome> {
        if !self.wait_suspect {
            return None;
        }
        if self.players[self.next_idx].user_name != user {
            return None;
        }

        let before = self
            .card_before_wild_draw_4
            .expect("set whenever wait_suspect is");
        let accused_idx = self.previous_idx();
        let success = self.players[accused_idx]
            .cards_when_wild_draw_4
            .iter()
            .any(|c| {
                c.color == before.color || (!before.is_wild() && c.content == before.content)
            });

        if success {
            self.give(accused_idx, 4);
        } else {
            self.give(self.next_idx, 6);
            self.advance();
        }
        self.wait_suspect = false;

        Some(SuspectOutcome {
            success,
            accused: self.players[accused_idx].user_name.clone(),
            accused_cards: self.players[accused_idx].hand.clone(),
        })
    }

    /// Accept the WILD-DRAW-4: draw four and pass the turn.
    pub fn dissuspect(&mut self, user: &str) -> bool {
        if !self.wait_suspect {
            return false;
        }
        if self.players[self.next_idx].user_name != user {
            return false;
        }
        self.give(self.next_idx, 4);
        self.advance();
        self.wait_suspect = false;
        true
    }

    /// First player with an empty hand.
    pub fn check_winner(&self) -> Option<&str> {
        self.players
            .iter()
            .find(|p| p.hand.is_empty())
            .map(|p| p.user_name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn card(color: CardColor, content: CardContent) -> Card {
        Card::new(color, content)
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("player{i}")).collect()
    }

    /// Build a table with fixed hands, a fixed queue (last element is the
    /// upcard) and player 0 to move, direction not reversed.
    fn rigged(hands: Vec<Vec<Card>>, queue: Vec<Card>) -> Uno {
        let upcard = *queue.last().expect("queue needs an upcard");
        Uno {
            players: hands
                .into_iter()
                .enumerate()
                .map(|(i, hand)| {
                    let mut p = Player::new(format!("player{i}"));
                    p.hand = hand;
                    p
                })
                .collect(),
            deck: queue.into_iter().collect(),
            last_color: upcard.color,
            last_content: upcard.content,
            card_before_wild_draw_4: None,
            reversed: false,
            wait_suspect: false,
            next_idx: 0,
        }
    }

    fn total_cards(game: &Uno) -> usize {
        game.deck.len() + game.players.iter().map(|p| p.hand.len()).sum::<usize>()
    }

    #[test]
    fn full_deck_composition() {
        let cards = full_deck();
        assert_eq!(cards.len(), 108);
        let count = |color, content| {
            cards
                .iter()
                .filter(|c| c.color == color && c.content == content)
                .count()
        };
        assert_eq!(count(CardColor::Red, CardContent::Zero), 1);
        assert_eq!(count(CardColor::Red, CardContent::Five), 2);
        assert_eq!(count(CardColor::Blue, CardContent::Reverse), 2);
        assert_eq!(count(CardColor::Black, CardContent::Wild), 4);
        assert_eq!(count(CardColor::Black, CardContent::WildDraw4), 4);
    }

    #[test]
    fn new_game_deals_seven_and_opens_on_a_digit() {
        let game = Uno::new(names(4));
        for player in game.players() {
            assert_eq!(player.hand().len(), 7);
        }
        assert!(game.last_card().is_number());
        assert_eq!(total_cards(&game), 108);
        assert!(!game.direction());
    }

    #[test]
    fn wrong_color_and_number_rejected_then_matching_accepted() {
        // Current hand [R5, B3], upcard R0.
        let mut game = rigged(
            vec![
                vec![
                    card(CardColor::Red, CardContent::Five),
                    card(CardColor::Blue, CardContent::Three),
                ],
                vec![card(CardColor::Green, CardContent::One)],
                vec![card(CardColor::Yellow, CardContent::Two)],
            ],
            vec![
                card(CardColor::Green, CardContent::Seven),
                card(CardColor::Yellow, CardContent::Eight),
                card(CardColor::Red, CardContent::Zero),
            ],
        );

        assert!(
            game.play(
                "player0",
                card(CardColor::Blue, CardContent::Three),
                CardColor::Blue
            )
            .is_none()
        );
        assert_eq!(game.next_player(), "player0");

        // Red matches by color; hand had two cards so say-UNO was required.
        let outcome = game
            .play(
                "player0",
                card(CardColor::Red, CardContent::Five),
                CardColor::Red,
            )
            .expect("matching color must be playable");
        assert!(outcome.punished);
        // Direction decreases from seat 0, wrapping to the last seat.
        assert_eq!(game.next_player(), "player2");
    }

    #[test]
    fn playing_a_card_not_in_hand_is_rejected() {
        let mut game = rigged(
            vec![
                vec![card(CardColor::Red, CardContent::Five)],
                vec![card(CardColor::Green, CardContent::One)],
                vec![card(CardColor::Yellow, CardContent::Two)],
            ],
            vec![
                card(CardColor::Green, CardContent::Seven),
                card(CardColor::Red, CardContent::Zero),
            ],
        );
        let before = total_cards(&game);
        assert!(
            game.play(
                "player0",
                card(CardColor::Red, CardContent::Nine),
                CardColor::Red
            )
            .is_none()
        );
        assert_eq!(total_cards(&game), before);
    }

    #[test]
    fn missing_say_uno_draws_two() {
        let mut game = rigged(
            vec![
                vec![
                    card(CardColor::Red, CardContent::Five),
                    card(CardColor::Red, CardContent::Six),
                ],
                vec![card(CardColor::Green, CardContent::One)],
                vec![card(CardColor::Yellow, CardContent::Two)],
            ],
            vec![
                card(CardColor::Green, CardContent::Seven),
                card(CardColor::Yellow, CardContent::Eight),
                card(CardColor::Blue, CardContent::Nine),
                card(CardColor::Red, CardContent::Zero),
            ],
        );

        let outcome = game
            .play(
                "player0",
                card(CardColor::Red, CardContent::Five),
                CardColor::Red,
            )
            .unwrap();
        assert!(outcome.punished);
        // One card left plus the two-card penalty.
        assert_eq!(game.hand_of("player0").unwrap().len(), 3);
    }

    #[test]
    fn say_uno_then_play_is_clean() {
        let mut game = rigged(
            vec![
                vec![
                    card(CardColor::Red, CardContent::Five),
                    card(CardColor::Red, CardContent::Six),
                ],
                vec![card(CardColor::Green, CardContent::One)],
                vec![card(CardColor::Yellow, CardContent::Two)],
            ],
            vec![
                card(CardColor::Green, CardContent::Seven),
                card(CardColor::Red, CardContent::Zero),
            ],
        );

        assert!(game.say_uno("player0"));
        let outcome = game
            .play(
                "player0",
                card(CardColor::Red, CardContent::Five),
                CardColor::Red,
            )
            .unwrap();
        assert!(!outcome.punished);
        assert_eq!(game.hand_of("player0").unwrap().len(), 1);
    }

    #[test]
    fn say_uno_by_bystander_is_penalized() {
        let mut game = rigged(
            vec![
                vec![
                    card(CardColor::Red, CardContent::Five),
                    card(CardColor::Red, CardContent::Six),
                ],
                vec![card(CardColor::Green, CardContent::One)],
                vec![card(CardColor::Yellow, CardContent::Two)],
            ],
            vec![
                card(CardColor::Green, CardContent::Seven),
                card(CardColor::Yellow, CardContent::Eight),
                card(CardColor::Blue, CardContent::Nine),
                card(CardColor::Red, CardContent::Zero),
            ],
        );
        assert!(!game.say_uno("player1"));
        assert_eq!(game.hand_of("player1").unwrap().len(), 3);
    }

    #[test]
    fn wild_draw_4_suspect_succeeds_against_a_held_match() {
        // player0 plays WILD-DRAW-4 while still holding a red card; the
        // upcard before the wild was red, so a suspect succeeds.
        let mut game = rigged(
            vec![
                vec![
                    card(CardColor::Black, CardContent::WildDraw4),
                    card(CardColor::Red, CardContent::Seven),
                    card(CardColor::Blue, CardContent::Two),
                ],
                vec![card(CardColor::Green, CardContent::One)],
                vec![card(CardColor::Yellow, CardContent::Two)],
            ],
            vec![
                card(CardColor::Green, CardContent::Seven),
                card(CardColor::Yellow, CardContent::Eight),
                card(CardColor::Blue, CardContent::Nine),
                card(CardColor::Green, CardContent::Two),
                card(CardColor::Yellow, CardContent::Five),
                card(CardColor::Red, CardContent::Zero),
            ],
        );

        let outcome = game
            .play(
                "player0",
                card(CardColor::Black, CardContent::WildDraw4),
                CardColor::Blue,
            )
            .unwrap();
        assert!(!outcome.punished);
        assert!(game.waiting_for_suspect());
        assert_eq!(game.next_player(), "player2");

        // Nothing else is allowed while the window is open.
        assert!(game.draw_one("player2").is_none());

        let suspect = game.suspect("player2").expect("window open, right caller");
        assert!(suspect.success);
        assert_eq!(suspect.accused, "player0");
        // Two left in hand plus a four-card penalty.
        assert_eq!(game.hand_of("player0").unwrap().len(), 6);
        assert_eq!(suspect.accused_cards.len(), 6);
        // The suspecter's turn resumes un-skipped.
        assert_eq!(game.next_player(), "player2");
        assert!(!game.waiting_for_suspect());
    }

    #[test]
    fn wild_draw_4_failed_suspect_draws_six_and_skips() {
        // player0's remaining cards match neither the prior color nor its
        // content, so the accusation fails.
        let mut game = rigged(
            vec![
                vec![
                    card(CardColor::Black, CardContent::WildDraw4),
                    card(CardColor::Blue, CardContent::Two),
                ],
                vec![card(CardColor::Green, CardContent::One)],
                vec![
                    card(CardColor::Yellow, CardContent::Two),
                    card(CardColor::Yellow, CardContent::Three),
                ],
            ],
            vec![
                card(CardColor::Green, CardContent::Seven),
                card(CardColor::Yellow, CardContent::Eight),
                card(CardColor::Blue, CardContent::Nine),
                card(CardColor::Green, CardContent::Two),
                card(CardColor::Yellow, CardContent::Five),
                card(CardColor::Blue, CardContent::Four),
                card(CardColor::Green, CardContent::Five),
                card(CardColor::Yellow, CardContent::Six),
                card(CardColor::Red, CardContent::Zero),
            ],
        );

        // Down to one card, but player0 said UNO first.
        assert!(game.say_uno("player0"));
        game.play(
            "player0",
            card(CardColor::Black, CardContent::WildDraw4),
            CardColor::Blue,
        )
        .unwrap();

        let suspect = game.suspect("player2").unwrap();
        assert!(!suspect.success);
        assert_eq!(game.hand_of("player2").unwrap().len(), 8);
        // Turn passed on to the next seat.
        assert_eq!(game.next_player(), "player1");
    }

    #[test]
    fn dissuspect_draws_four_and_advances() {
        let mut game = rigged(
            vec![
                vec![
                    card(CardColor::Black, CardContent::WildDraw4),
                    card(CardColor::Blue, CardContent::Two),
                ],
                vec![card(CardColor::Green, CardContent::One)],
                vec![card(CardColor::Yellow, CardContent::Two)],
            ],
            vec![
                card(CardColor::Green, CardContent::Seven),
                card(CardColor::Yellow, CardContent::Eight),
                card(CardColor::Blue, CardContent::Nine),
                card(CardColor::Green, CardContent::Two),
                card(CardColor::Yellow, CardContent::Five),
                card(CardColor::Blue, CardContent::Four),
                card(CardColor::Red, CardContent::Zero),
            ],
        );

        assert!(game.say_uno("player0"));
        game.play(
            "player0",
            card(CardColor::Black, CardContent::WildDraw4),
            CardColor::Green,
        )
        .unwrap();
        assert!(game.dissuspect("player2"));
        assert_eq!(game.hand_of("player2").unwrap().len(), 5);
        assert_eq!(game.next_player(), "player1");
        assert_eq!(game.specified_color(), CardColor::Green);
    }

    #[test]
    fn draw_one_then_only_the_drawn_card_plays() {
        let mut game = rigged(
            vec![
                vec![card(CardColor::Red, CardContent::Five)],
                vec![card(CardColor::Green, CardContent::One)],
                vec![card(CardColor::Yellow, CardContent::Two)],
            ],
            vec![
                // player0 will draw this red 9.
                card(CardColor::Red, CardContent::Nine),
                card(CardColor::Yellow, CardContent::Eight),
                card(CardColor::Red, CardContent::Zero),
            ],
        );

        let drawn = game.draw_one("player0").unwrap();
        assert_eq!(drawn.card, card(CardColor::Red, CardContent::Nine));
        assert!(!drawn.punished);
        assert!(game.draw_one("player0").is_none(), "second draw rejected");

        // The held R5 also matches the upcard, but after a draw only the
        // drawn card may be played.
        assert!(
            game.play(
                "player0",
                card(CardColor::Red, CardContent::Five),
                CardColor::Red
            )
            .is_none()
        );
        assert!(
            game.play(
                "player0",
                card(CardColor::Red, CardContent::Nine),
                CardColor::Red
            )
            .is_some()
        );
    }

    #[test]
    fn skip_after_drawing_one_passes_the_turn() {
        let mut game = rigged(
            vec![
                vec![card(CardColor::Blue, CardContent::Five)],
                vec![card(CardColor::Green, CardContent::One)],
                vec![card(CardColor::Yellow, CardContent::Two)],
            ],
            vec![
                card(CardColor::Green, CardContent::Nine),
                card(CardColor::Yellow, CardContent::Eight),
                card(CardColor::Red, CardContent::Zero),
            ],
        );

        assert!(!game.skip_after_drawing_one("player0"), "nothing drawn yet");
        game.draw_one("player0").unwrap();
        assert!(game.skip_after_drawing_one("player0"));
        assert_eq!(game.next_player(), "player2");
    }

    #[test]
    fn reverse_flips_before_the_cursor_moves() {
        let mut game = rigged(
            vec![
                vec![
                    card(CardColor::Red, CardContent::Reverse),
                    card(CardColor::Blue, CardContent::Two),
                ],
                vec![card(CardColor::Green, CardContent::One)],
                vec![card(CardColor::Yellow, CardContent::Two)],
            ],
            vec![
                card(CardColor::Green, CardContent::Seven),
                card(CardColor::Yellow, CardContent::Eight),
                card(CardColor::Blue, CardContent::Nine),
                card(CardColor::Red, CardContent::Zero),
            ],
        );

        game.play(
            "player0",
            card(CardColor::Red, CardContent::Reverse),
            CardColor::Red,
        )
        .unwrap();
        assert!(game.direction());
        // Reversed direction increments, so seat 1 moves next.
        assert_eq!(game.next_player(), "player1");
    }

    #[test]
    fn draw_2_feeds_the_next_seat_and_skips_it() {
        let mut game = rigged(
            vec![
                vec![
                    card(CardColor::Red, CardContent::Draw2),
                    card(CardColor::Blue, CardContent::Two),
                ],
                vec![card(CardColor::Green, CardContent::One)],
                vec![card(CardColor::Yellow, CardContent::Two)],
            ],
            vec![
                card(CardColor::Green, CardContent::Seven),
                card(CardColor::Yellow, CardContent::Eight),
                card(CardColor::Blue, CardContent::Nine),
                card(CardColor::Red, CardContent::Zero),
            ],
        );

        game.play(
            "player0",
            card(CardColor::Red, CardContent::Draw2),
            CardColor::Red,
        )
        .unwrap();
        assert_eq!(game.hand_of("player2").unwrap().len(), 3);
        assert_eq!(game.next_player(), "player1");
    }

    #[test]
    fn winner_is_the_first_empty_hand() {
        let mut game = rigged(
            vec![
                vec![
                    card(CardColor::Red, CardContent::Five),
                    card(CardColor::Blue, CardContent::Five),
                ],
                vec![card(CardColor::Green, CardContent::One)],
                vec![
                    card(CardColor::Yellow, CardContent::Five),
                    card(CardColor::Green, CardContent::Three),
                ],
            ],
            vec![
                card(CardColor::Green, CardContent::Seven),
                card(CardColor::Blue, CardContent::Nine),
                card(CardColor::Red, CardContent::Zero),
            ],
        );

        assert!(game.check_winner().is_none());
        assert!(game.say_uno("player0"));
        game.play(
            "player0",
            card(CardColor::Red, CardContent::Five),
            CardColor::Red,
        )
        .unwrap();
        assert!(game.check_winner().is_none());

        // Back around to player0's last card.
        game.play(
            "player2",
            card(CardColor::Yellow, CardContent::Five),
            CardColor::Yellow,
        )
        .unwrap();
        game.draw_one("player1").unwrap();
        assert!(game.skip_after_drawing_one("player1"));
        game.play(
            "player0",
            card(CardColor::Blue, CardContent::Five),
            CardColor::Blue,
        )
        .unwrap();
        assert_eq!(game.check_winner(), Some("player0"));
    }

    proptest! {
        /// Whatever sequence of actions is thrown at the table, the hands
        /// and the queue always partition the 108 cards.
        #[test]
        fn deck_conservation(actions in proptest::collection::vec((0u8..6, 0usize..3, 0usize..8, 0u8..4), 0..120)) {
            let mut game = Uno::new(names(3));
            for (op, seat, card_pick, color) in actions {
                let user = format!("player{seat}");
                let chosen = CardColor::from_index(color).unwrap();
                match op {
                    0 => {
                        let card = game
                            .hand_of(&user)
                            .and_then(|h| h.get(card_pick % h.len().max(1)).copied());
                        if let Some(card) = card {
                            let _ = game.play(&user, card, chosen);
                        }
                    },
                    1 => { let _ = game.draw_one(&user); },
                    2 => { let _ = game.skip_after_drawing_one(&user); },
                    3 => { let _ = game.say_uno(&user); },
                    4 => { let _ = game.suspect(&user); },
                    _ => { let _ = game.dissuspect(&user); },
                }
                prop_assert_eq!(total_cards(&game), 108);
            }
        }
    }
}
