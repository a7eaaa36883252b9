use entities::ENTITIES;
use std::io::{BufWriter, Write};
use std::{env, fs, path::PathBuf};

// entity::lookup is handed the inner entity name, like "amp" for "&amp;",
// and only semicolon-terminated references are valid CommonMark. Filter the
// table down to those, strip the "&"/";", and sort for binary search (the
// upstream table interleaves upper- and lower-case variants).
fn main() {
    let out_dir: PathBuf = env::var("OUT_DIR").unwrap().parse().unwrap();

    let mut named = ENTITIES
        .iter()
        .filter(|e| e.entity.starts_with('&') && e.entity.ends_with(';'))
        .collect::<Vec<_>>();
    named.sort_by_key(|e| e.entity);

    let out = fs::File::create(out_dir.join("entitydata.rs")).unwrap();
    let mut bw = BufWriter::new(out);
    writeln!(bw, "mod entitydata {{").unwrap();
    writeln!(
        bw,
        "    pub static NAMED_ENTITIES: &[(&'static str, &'static str); {}] = &[",
        named.len()
    )
    .unwrap();
    for e in named {
        writeln!(
            bw,
            "        ({:?}, {:?}),",
            &e.entity[1..e.entity.len() - 1],
            &e.characters
        )
        .unwrap();
    }
    writeln!(bw, "    ];").unwrap();
    writeln!(bw, "}}").unwrap();
}
