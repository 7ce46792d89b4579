use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use std::fs;

const TABLE_JSON: &str = r#"{
    "holes": [
        [
            -13,
            32
        ],
        [
            -35,
            -35
        ],
        [
            35,
            -35
        ],
        [
            35,
            35
        ]
    ]
}"#;

fn hole(reference: &str, at: &str) -> String {
    format!(
        r#"	(footprint "MountingHole:MountingHole_3.2mm_M3"
		(layer "F.Cu")
		(at {at})
		(property "Reference" "{reference}"
			(at 0 -4.2 0)
		)
		(property "Value" "MountingHole_3.2mm_M3"
			(at 0 4.2 0)
		)
	)
"#
    )
}

const RESISTOR: &str = r#"	(footprint "Resistor_SMD:R_0603_1608Metric"
		(layer "F.Cu")
		(at 45.5 30.25 90)
		(property "Reference" "R1")
		(property "Value" "10k")
	)
"#;

/// Board with the holes in file order H3, H1, H4, H2.
fn board() -> String {
    let mut text = String::from("(kicad_pcb\n\t(version 20240108)\n");
    text.push_str(&hole("H3", "1 1"));
    text.push_str(&hole("H1", "2 2"));
    text.push_str(RESISTOR);
    text.push_str(&hole("H4", "3 3"));
    text.push_str(&hole("H2", "4 4 180"));
    text.push_str(")\n");
    text
}

fn mounthole(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mounthole").unwrap();
    cmd.current_dir(dir.path()).env_remove("RUST_LOG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

#[test]
fn test_generate_writes_table_and_csv() {
    let dir = TempDir::new().unwrap();

    let stdout = stdout_of(mounthole(&dir).arg("generate"));
    assert_eq!(
        stdout,
        "hole_0 x,-13\nhole_0 y,32\n\
         hole_1 x,-35\nhole_1 y,-35\n\
         hole_2 x,35\nhole_2 y,-35\n\
         hole_3 x,35\nhole_3 y,35\n"
    );

    let written = fs::read_to_string(dir.child("pcb/mount_locations.json").path()).unwrap();
    assert_eq!(written, TABLE_JSON);
}

#[test]
fn test_generate_custom_output() {
    let dir = TempDir::new().unwrap();
    mounthole(&dir)
        .args(["generate", "--output", "out/table.json"])
        .assert()
        .success();
    let written = fs::read_to_string(dir.child("out/table.json").path()).unwrap();
    assert_eq!(written, TABLE_JSON);
    assert!(!dir.child("pcb").path().exists());
}

#[test]
fn test_place_by_reference() {
    let dir = TempDir::new().unwrap();
    dir.child("pcb/mount_locations.json")
        .write_str(TABLE_JSON)
        .unwrap();
    dir.child("board.kicad_pcb").write_str(&board()).unwrap();

    let stdout = stdout_of(mounthole(&dir).args(["place", "--board", "board.kicad_pcb"]));
    assert!(stdout.contains("MountingHole_3.2mm_M3 DOES match key mounting hole"));
    assert!(stdout.contains("10k does not match mounting hole"));
    assert!(stdout.contains("hole_0 H1: (2, 2) -> (77, 58)"));
    assert!(stdout.contains("hole_3 H4: (3, 3) -> (125, 55)"));

    let expected = board()
        .replace("(at 1 1)", "(at 125 125)")
        .replace("(at 2 2)", "(at 77 58)")
        .replace("(at 3 3)", "(at 125 55)")
        .replace("(at 4 4 180)", "(at 55 125 180)");
    let placed = fs::read_to_string(dir.child("board.kicad_pcb").path()).unwrap();
    assert_eq!(placed, expected);
}

#[test]
fn test_place_ordinal_follows_file_order() {
    let dir = TempDir::new().unwrap();
    dir.child("pcb/mount_locations.json")
        .write_str(TABLE_JSON)
        .unwrap();
    dir.child("board.kicad_pcb").write_str(&board()).unwrap();

    mounthole(&dir)
        .args([
            "place",
            "--board",
            "board.kicad_pcb",
            "--pairing",
            "ordinal",
        ])
        .assert()
        .success();

    let expected = board()
        .replace("(at 1 1)", "(at 77 58)")
        .replace("(at 2 2)", "(at 55 125)")
        .replace("(at 3 3)", "(at 125 125)")
        .replace("(at 4 4 180)", "(at 125 55 180)");
    let placed = fs::read_to_string(dir.child("board.kicad_pcb").path()).unwrap();
    assert_eq!(placed, expected);
}

#[test]
fn test_place_count_mismatch_leaves_board_untouched() {
    let dir = TempDir::new().unwrap();
    dir.child("pcb/mount_locations.json")
        .write_str(TABLE_JSON)
        .unwrap();
    let three_holes = format!(
        "(kicad_pcb\n{}{}{})\n",
        hole("H1", "1 1"),
        hole("H2", "2 2"),
        hole("H3", "3 3")
    );
    dir.child("board.kicad_pcb").write_str(&three_holes).unwrap();

    let output = mounthole(&dir)
        .args(["place", "--board", "board.kicad_pcb"])
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output).unwrap();
    assert!(stderr.contains("Error:"));
    assert!(
        stderr.contains("found 3 mounting hole footprints but the coordinate table has 4 entries")
    );

    let after = fs::read_to_string(dir.child("board.kicad_pcb").path()).unwrap();
    assert_eq!(after, three_holes);
}

#[test]
fn test_place_dry_run_and_output() {
    let dir = TempDir::new().unwrap();
    dir.child("pcb/mount_locations.json")
        .write_str(TABLE_JSON)
        .unwrap();
    dir.child("board.kicad_pcb").write_str(&board()).unwrap();

    let stdout = stdout_of(mounthole(&dir).args([
        "place",
        "--board",
        "board.kicad_pcb",
        "--dry-run",
    ]));
    assert!(stdout.contains("hole_1 H2: (4, 4) -> (55, 125)"));
    let after = fs::read_to_string(dir.child("board.kicad_pcb").path()).unwrap();
    assert_eq!(after, board());

    mounthole(&dir)
        .args([
            "place",
            "--board",
            "board.kicad_pcb",
            "--output",
            "placed.kicad_pcb",
        ])
        .assert()
        .success();
    let after = fs::read_to_string(dir.child("board.kicad_pcb").path()).unwrap();
    assert_eq!(after, board());
    let placed = fs::read_to_string(dir.child("placed.kicad_pcb").path()).unwrap();
    assert!(placed.contains("(at 77 58)"));
}

#[test]
fn test_place_reads_config() {
    let dir = TempDir::new().unwrap();
    dir.child("holes.json").write_str(TABLE_JSON).unwrap();
    dir.child("board.kicad_pcb").write_str(&board()).unwrap();
    dir.child("mount.toml")
        .write_str(
            r#"
[paths]
board = "board.kicad_pcb"
table = "holes.json"

[transform]
offset_x = 0.0
offset_y = 0.0
"#,
        )
        .unwrap();

    mounthole(&dir).arg("place").assert().success();
    let placed = fs::read_to_string(dir.child("board.kicad_pcb").path()).unwrap();
    assert!(placed.contains("(at 27 8)"));
}

#[test]
fn test_place_rejects_nan_transform() {
    let dir = TempDir::new().unwrap();
    dir.child("pcb/mount_locations.json")
        .write_str(TABLE_JSON)
        .unwrap();
    dir.child("board.kicad_pcb").write_str(&board()).unwrap();
    dir.child("mount.toml")
        .write_str("[transform]\noffset_x = nan\n")
        .unwrap();

    let output = mounthole(&dir)
        .args(["place", "--board", "board.kicad_pcb"])
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output).unwrap();
    assert!(stderr.contains("transform.offset_x must be a finite number"));

    let after = fs::read_to_string(dir.child("board.kicad_pcb").path()).unwrap();
    assert_eq!(after, board());
    assert!(!after.contains("NaN"));
}

#[test]
fn test_place_without_board_fails() {
    let dir = TempDir::new().unwrap();
    let output = mounthole(&dir)
        .arg("place")
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8(output).unwrap().contains("--board"));
}

#[test]
fn test_scan() {
    let dir = TempDir::new().unwrap();
    dir.child("board.kicad_pcb").write_str(&board()).unwrap();

    let stdout = stdout_of(mounthole(&dir).args(["scan", "--board", "board.kicad_pcb"]));
    assert_eq!(
        stdout,
        "MountingHole_3.2mm_M3 DOES match key mounting hole\n\
         MountingHole_3.2mm_M3 DOES match key mounting hole\n\
         10k does not match mounting hole\n\
         MountingHole_3.2mm_M3 DOES match key mounting hole\n\
         MountingHole_3.2mm_M3 DOES match key mounting hole\n"
    );
    // scan never writes
    let after = fs::read_to_string(dir.child("board.kicad_pcb").path()).unwrap();
    assert_eq!(after, board());
}

#[test]
fn test_actions_lists_plugin() {
    let dir = TempDir::new().unwrap();
    let stdout = stdout_of(mounthole(&dir).arg("actions"));
    assert!(stdout.contains("Mount hole layout plugin"));
    assert!(stdout.contains("warning light utils"));
    assert!(
        stdout.contains("automatically lays out hole locations according to cad specification")
    );
}
