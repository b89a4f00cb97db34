// Raw and run-length optimized streams must leave the engine in the same
// state and produce the same output, whatever the configuration.
use bf_engine::{optimize, Engine, EngineConfig, EngineError, Program};

fn programs() -> Vec<String> {
    let mut programs: Vec<String> = [
        "",
        "+++++",
        "+++>+++",
        "++++++++[>++++++++<-]>.",
        "++++++++++[>+++++++>++++++++++>+++>+<<<<-]>++.>+.+++++++..+++.>++.<<+++++++++++++++.>.+++.------.--------.>+.>.",
        ">>>>><<<<<<<<+++",
        "----------.",
        ",,,>,,.<.",
        "+++[>+++[>+++<-]<-]>>..",
        ">>+<<<",
        ">+>+>+<<<<<<<<-",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let mut rng = Lcg(0x5eed);

    // Loop-free programs.
    for _ in 0..40 {
        let mut p = String::new();
        for _ in 0..200 {
            push_run(&mut p, &mut rng, &['>', '<', '+', '-', '.', ',']);
        }
        programs.push(p);
    }

    // Programs mixing free runs with bounded loops, some nested.
    for _ in 0..40 {
        programs.push(looping_program(&mut rng));
    }
    programs
}

struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

// Favor runs so the optimizer has something to merge.
fn push_run(p: &mut String, rng: &mut Lcg, alphabet: &[char]) -> (char, i64) {
    let pick = alphabet[rng.below(alphabet.len() as u64) as usize];
    let repeat = 1 + rng.below(4) as i64;
    for _ in 0..repeat {
        p.push(pick);
    }
    (pick, repeat)
}

/// Free runs interleaved with loops on a fresh counter cell. Each loop
/// decrements its counter once per pass and its body only touches the cells
/// to the right, so it stops after at most a few passes in any configuration.
fn looping_program(rng: &mut Lcg) -> String {
    let body = ['+', '-', '.'];
    let mut p = String::new();
    // Offset of the pointer and the highest offset touched so far.
    let mut pos: i64 = 0;
    let mut high: i64 = 0;

    for _ in 0..30 {
        if rng.below(3) == 0 {
            let fresh = high + 1;
            p.extend(std::iter::repeat_n('>', (fresh - pos) as usize));
            p.extend(std::iter::repeat_n('+', 1 + rng.below(4) as usize));
            p.push_str("[->");
            if rng.below(2) == 0 {
                for _ in 0..1 + rng.below(4) {
                    push_run(&mut p, rng, &body);
                }
                p.push_str("<]");
                high = fresh + 1;
            } else {
                p.extend(std::iter::repeat_n('+', 1 + rng.below(3) as usize));
                p.push_str("[->");
                for _ in 0..1 + rng.below(4) {
                    push_run(&mut p, rng, &body);
                }
                p.push_str("<]<]");
                high = fresh + 2;
            }
            pos = fresh;
        } else {
            let (pick, repeat) = push_run(&mut p, rng, &['>', '<', '+', '-', '.', ',']);
            match pick {
                '>' => pos += repeat,
                '<' => pos -= repeat,
                _ => {}
            }
            high = high.max(pos);
        }
    }
    p
}

fn configs() -> Vec<EngineConfig> {
    let mut configs = Vec::new();
    for bits in [8, 16, 32] {
        for negative_addresses in [false, true] {
            for negative_values in [false, true] {
                configs.push(EngineConfig::new(negative_addresses, negative_values, bits, false).unwrap());
            }
        }
    }
    configs
}

struct Outcome {
    result: Result<(), String>,
    cells: Vec<(i64, i64)>,
    pointer: i64,
    output: Vec<u8>,
}

fn execute(cfg: EngineConfig, program: &Program, input: &[u8]) -> Outcome {
    let mut engine = Engine::new(cfg);
    let mut output = Vec::new();
    let result = engine
        .run_with_io(program, input, &mut output)
        .map_err(|e| match e {
            // Token indices differ between the two streams; compare the kind.
            EngineError::NegativeAddress { .. } => "negative address".to_string(),
            EngineError::UnmatchedBracket { kind, .. } => format!("unmatched {kind}"),
            other => other.to_string(),
        });
    Outcome {
        result,
        cells: engine.tape().nonzero_cells(),
        pointer: engine.pointer(),
        output,
    }
}

#[test]
fn raw_and_optimized_runs_agree() {
    let input = b"Hello, input stream! 0123456789 \xc3\xa9";
    for cfg in configs() {
        for source in programs() {
            let raw = execute(cfg, &Program::raw(&source), input);
            let opt = execute(cfg, &optimize(&source), input);
            assert_eq!(raw.result, opt.result, "result differs for {source:?} under {cfg:?}");
            assert_eq!(raw.output, opt.output, "output differs for {source:?} under {cfg:?}");
            // Also after an error: a failed move must stop where single steps stop.
            assert_eq!(raw.cells, opt.cells, "cells differ for {source:?} under {cfg:?}");
            assert_eq!(raw.pointer, opt.pointer, "pointer differs for {source:?} under {cfg:?}");
        }
    }
}

#[test]
fn optimized_stream_is_never_longer() {
    for source in programs() {
        assert!(optimize(&source).len() <= Program::raw(&source).len());
    }
}
