use std::path::PathBuf;

use il2scope::{
    decompiler::{JSON_OUTPUT_FILE, TEXT_OUTPUT_FILE},
    prelude::*,
};
use serde_json::Value;

fn sample_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/samples")
        .join(name)
}

fn load_sample() -> MetadataSnapshot {
    MetadataSnapshot::from_file(&sample_path("game_snapshot.json")).unwrap()
}

fn render(snapshot: &MetadataSnapshot, config: DumpConfig) -> (String, Value) {
    let decompiler = Decompiler::new(snapshot, config);
    let outcomes = decompiler.assemble();

    let mut text = Vec::new();
    decompiler.render_text(&outcomes, &mut text).unwrap();
    let mut json = Vec::new();
    decompiler.render_json(&outcomes, &mut json).unwrap();

    (
        String::from_utf8(text).unwrap(),
        serde_json::from_slice(&json).unwrap(),
    )
}

#[test]
fn text_matches_reference_dump() {
    let snapshot = load_sample();
    let expected = std::fs::read_to_string(sample_path("game_dump.cs")).unwrap();

    let (text, _) = render(&snapshot, DumpConfig::default());
    assert_eq!(text, expected);
}

#[test]
fn json_mirrors_text() {
    let snapshot = load_sample();
    let (text, json) = render(&snapshot, DumpConfig::default());

    let images = json["images"].as_array().unwrap();
    assert_eq!(images.len(), 3);

    for image in images {
        for object in image["typedObjects"].as_array().unwrap() {
            let type_name = object["typeName"].as_str().unwrap();
            let category = object["category"].as_str().unwrap();
            assert!(text.contains(&format!("{category} {type_name}")));

            for method in object["methods"].as_array().unwrap() {
                let signature = format!(
                    "{} {}(",
                    method["returnType"].as_str().unwrap(),
                    method["name"].as_str().unwrap()
                );
                assert!(text.contains(&signature), "missing {signature}");
            }
            for field in object["fields"].as_array().unwrap() {
                let declaration = format!(
                    "{} {}",
                    field["type"].as_str().unwrap(),
                    field["name"].as_str().unwrap()
                );
                assert!(text.contains(&declaration), "missing {declaration}");
            }
        }
    }

    let player = &images[0]["typedObjects"][0];
    assert_eq!(player["namespace"], "Game");
    assert_eq!(
        player["extends"],
        serde_json::json!(["MonoBehaviour", "IDamageable"])
    );
    assert_eq!(player["visibility"], serde_json::json!(["public"]));
    assert_eq!(
        player["attributes"],
        "[DisallowMultipleComponent] // RVA: 0x1800 Offset: 0xC00 VA: 0x180001800\n"
    );
    assert_eq!(player["fields"][1]["offset"], 0x14);
    assert_eq!(player["fields"][2]["defaultValue"], "3");
    // Constants have no storage, their offset is reported as zero
    assert_eq!(player["fields"][2]["offset"], 0);
    assert_eq!(player["fields"][2]["visibility"], serde_json::json!(["public", "const"]));
    assert_eq!(player["properties"][0]["accessors"], serde_json::json!(["get", "set"]));
    assert_eq!(player["methods"][3]["slot"], 4);
    assert_eq!(player["methods"][3]["parameters"][0]["defaultValue"], "1");
    assert_eq!(player["methods"][0]["slot"], Value::Null);

    let find = &images[1]["typedObjects"][1]["methods"][0];
    assert_eq!(find["name"], "Find<T>");
    let instances = find["genericInstances"].as_array().unwrap();
    assert_eq!(instances.len(), 3);
    assert_eq!(instances[2]["name"], "Find<object>");
    assert_eq!(instances[2]["rva"], 0x2300);

    let vector = &images[1]["typedObjects"][0];
    assert_eq!(vector["category"], "struct");
    assert_eq!(vector["attributes"], "[Serializable]\n");
}

#[test]
fn failed_image_is_isolated() {
    let mut snapshot = load_sample();
    // Vector2.x, in the second of three images
    snapshot.fields[6].type_index = 999;

    let decompiler = Decompiler::new(&snapshot, DumpConfig::default());
    let outcomes = decompiler.assemble();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[1].is_failed());
    assert_eq!(DumpSummary::from_outcomes(&outcomes).failed, 1);

    let (text, json) = render(&snapshot, DumpConfig::default());

    assert!(text.starts_with(
        "// Image 0: Assembly-CSharp.dll - 0\n\
         // Image 1: UnityEngine.CoreModule.dll - 3\n\
         // Image 2: Mono.Security.dll - 5\n"
    ));
    let player = text.find("class Player").unwrap();
    let failure = text
        .find("/*ERROR: Some errors in dumping image UnityEngine.CoreModule.dll\n")
        .unwrap();
    let hash = text.find("class Hash").unwrap();
    assert!(player < failure && failure < hash);
    assert!(!text.contains("struct Vector2"));

    let images = json["images"].as_array().unwrap();
    assert_eq!(images.len(), 3);
    assert_eq!(images[1]["name"], "UnityEngine.CoreModule.dll");
    assert_eq!(
        images[1]["error"],
        "Index 999 is out of range for table 'types'"
    );
    assert_eq!(images[1]["typedObjects"], serde_json::json!([]));
    assert_eq!(images[2]["typedObjects"][0]["typeName"], "Hash");
}

#[test]
fn oversized_type_count_fails_only_its_image() {
    let mut snapshot = load_sample();
    snapshot.images[1].type_count = u32::MAX;

    let decompiler = Decompiler::new(&snapshot, DumpConfig::default());
    let outcomes = decompiler.assemble();
    assert_eq!(outcomes.len(), 3);
    assert!(!outcomes[0].is_failed());
    assert!(outcomes[1].is_failed());
    assert!(!outcomes[2].is_failed());

    let (text, json) = render(&snapshot, DumpConfig::default());
    assert!(text.contains("public class Player : MonoBehaviour, IDamageable"));
    assert!(text.contains("internal sealed class Hash"));
    assert!(text.contains(
        "/*ERROR: Some errors in dumping image UnityEngine.CoreModule.dll\n\
         Index 4294967297 is out of range for table 'type_defs'*/\n"
    ));

    let images = json["images"].as_array().unwrap();
    assert_eq!(images[1]["typedObjects"], serde_json::json!([]));
    assert_eq!(
        images[1]["error"],
        "Index 4294967297 is out of range for table 'type_defs'"
    );
    assert_eq!(images[0]["typedObjects"].as_array().unwrap().len(), 3);
    assert_eq!(images[2]["typedObjects"][0]["typeName"], "Hash");
}

#[test]
fn output_is_deterministic() {
    let snapshot = load_sample();
    let (first_text, first_json) = render(&snapshot, DumpConfig::default());
    let (second_text, second_json) = render(&snapshot, DumpConfig::default());
    let (parallel_text, parallel_json) = render(
        &snapshot,
        DumpConfig {
            parallel: true,
            ..DumpConfig::default()
        },
    );

    assert_eq!(first_text, second_text);
    assert_eq!(first_json, second_json);
    assert_eq!(first_text, parallel_text);
    assert_eq!(first_json, parallel_json);
}

#[test]
fn declarations_only_omits_annotations() {
    let snapshot = load_sample();
    let (text, json) = render(&snapshot, DumpConfig::declarations_only());

    assert!(!text.contains("// RVA"));
    assert!(!text.contains("TypeDefIndex"));
    assert!(!text.contains("; // 0x"));
    assert!(!text.contains("[Serializable]"));
    assert!(!text.contains("DisallowMultipleComponent"));
    // Generic instances keep their group addresses
    assert!(text.contains("\t|-RVA: 0x2200 Offset: 0x1600 VA: 0x180002200\n\t|-Utils.Find<int>\n"));
    assert!(text.contains("public class Player : MonoBehaviour, IDamageable\n{"));
    assert!(text.contains("\tprivate int health;\n"));

    let player = &json["images"][0]["typedObjects"][0];
    assert!(player.get("typeDefIndex").is_none());
    assert_eq!(player["fields"][0]["offset"], 0);
    assert_eq!(player["methods"][0]["rva"], 0);
}

#[test]
fn decompile_writes_both_artifacts() {
    let snapshot = load_sample();
    let dir = tempfile::tempdir().unwrap();

    let decompiler = Decompiler::new(&snapshot, DumpConfig::default());
    let summary = decompiler.decompile(dir.path()).unwrap();
    assert_eq!(summary, DumpSummary { images: 3, failed: 0 });

    let expected = std::fs::read_to_string(sample_path("game_dump.cs")).unwrap();
    let text = std::fs::read_to_string(dir.path().join(TEXT_OUTPUT_FILE)).unwrap();
    assert_eq!(text, expected);

    let json: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(JSON_OUTPUT_FILE)).unwrap())
            .unwrap();
    assert_eq!(json["images"][2]["name"], "Mono.Security.dll");
}

#[test]
fn config_file_controls_artifacts() {
    let snapshot = load_sample();
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    std::fs::write(&config_path, r#"{ "DumpToCs": false, "DumpMethod": false }"#).unwrap();

    let config = DumpConfig::from_file(&config_path).unwrap();
    let decompiler = Decompiler::new(&snapshot, config);
    decompiler.decompile(dir.path()).unwrap();

    assert!(!dir.path().join(TEXT_OUTPUT_FILE).exists());
    let json: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(JSON_OUTPUT_FILE)).unwrap())
            .unwrap();
    assert_eq!(
        json["images"][0]["typedObjects"][0]["methods"],
        serde_json::json!([])
    );
}
