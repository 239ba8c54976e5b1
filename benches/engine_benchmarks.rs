use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use recite::engine::game::{Game, GameOptions, Input};
use recite::engine::scoring::{ScoreTable, Scoring};
use recite::engine::secret::{Board, prepare};

fn make_text(words: usize) -> String {
    let vocab = ["the", "quick", "brown", "fox", "jumps", "over", "a", "lazy", "dog"];
    let mut text = String::new();
    for i in 0..words {
        if i > 0 {
            text.push(if i % 12 == 0 { '\n' } else { ' ' });
        }
        if i % 20 == 5 {
            text.push('[');
            text.push_str(vocab[i % vocab.len()]);
            text.push(']');
        } else {
            text.push_str(vocab[i % vocab.len()]);
        }
        if i % 9 == 8 {
            text.push(',');
        }
    }
    text.push('.');
    text
}

fn bench_prepare(c: &mut Criterion) {
    let text = make_text(400);

    c.bench_function("prepare secret (400 words)", |b| {
        b.iter(|| prepare(black_box(&text)))
    });
}

fn bench_random_reveals(c: &mut Criterion) {
    let text = make_text(400);

    c.bench_function("reveal 50 letters + 10 words (400 words)", |b| {
        b.iter(|| {
            let mut rng = SmallRng::seed_from_u64(7);
            let mut board = Board::from_text(black_box(&text));
            board.reveal_random_letters(50, &mut rng);
            board.reveal_random_words(10, &mut rng);
            board
        })
    });
}

fn bench_full_game(c: &mut Criterion) {
    let text = make_text(200);
    let typed: Vec<char> = prepare(&text).secret;
    let options = GameOptions {
        first_letter: true,
        ..GameOptions::default()
    };

    c.bench_function("type whole card (200 words, first letters shown)", |b| {
        b.iter(|| {
            let mut rng = SmallRng::seed_from_u64(1);
            let scoring = Scoring::new(&text, "bench", ScoreTable::default(), &[]);
            let mut game = Game::new(&text, scoring, &options, &mut rng);
            for &ch in &typed {
                game.handle_input(Input::Char(black_box(ch)));
            }
            game
        })
    });
}

criterion_group!(benches, bench_prepare, bench_random_reveals, bench_full_game);
criterion_main!(benches);
