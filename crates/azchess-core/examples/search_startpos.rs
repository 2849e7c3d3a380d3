//! Run one search from the starting position with the flat-prior
//! stand-in oracle and print the most-visited actions.
//!
//! ```
//! cargo run --example search_startpos
//! ```

use azchess_core::{decode_action, Mcts, Position, RepetitionMap, TrainerConfig, UniformOracle};

fn main() -> anyhow::Result<()> {
    let config = TrainerConfig {
        num_searches: 400,
        ..TrainerConfig::default()
    };

    let root = Position::startpos();
    let mut map = RepetitionMap::new();
    map.insert(root.zobrist, 1);

    let mut mcts = Mcts::new(&config, config.seed)?;
    let policy = mcts.search(&mut UniformOracle, &root, &map)?;

    let mut ranked: Vec<(usize, f32)> = policy
        .iter()
        .enumerate()
        .filter(|(_, &p)| p > 0.0)
        .map(|(action, &p)| (action, p))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    println!("top actions after {} search iterations:", config.num_searches);
    for (action, p) in ranked.iter().take(5) {
        let (from_sq, move_type) = decode_action(*action);
        println!("  action {action:4}  from {from_sq:2}  type {move_type:2}  visits {p:.3}");
    }
    Ok(())
}
