use json_transform::{from_value, patch};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};

struct Params {
    array_size: usize,
    map_size: usize,
    depth: usize,
    key_size: usize,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            array_size: 4,
            map_size: 4,
            depth: 4,
            key_size: 8,
        }
    }
}

fn rand_str<R: Rng>(rng: &mut R, max_len: usize) -> String {
    let len = rng.gen_range(1..=max_len);
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

fn rand_literal<R: Rng>(rng: &mut R) -> Value {
    match rng.gen_range(0..4) {
        0 => Value::Null,
        1 => Value::String(rand_str(rng, 12)),
        2 => Value::Bool(rng.gen()),
        _ => Value::from(rng.gen::<u64>()),
    }
}

impl Params {
    fn gen<R: Rng>(&self, rng: &mut R) -> Value {
        self.gen_internal(self.depth, rng)
    }

    fn gen_internal<R: Rng>(&self, depth: usize, rng: &mut R) -> Value {
        if depth == 0 {
            rand_literal(rng)
        } else if rng.gen::<bool>() {
            let len = rng.gen_range(1..=self.array_size);
            let vec: Vec<Value> = (0..len)
                .map(|_| self.gen_internal(depth - 1, rng))
                .collect();
            Value::from(vec)
        } else {
            let len = rng.gen_range(1..=self.map_size);
            let map: Map<String, Value> = (0..len)
                .map(|_| (rand_str(rng, self.key_size), self.gen_internal(depth - 1, rng)))
                .collect();
            Value::from(map)
        }
    }
}

fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

fn leaf_pointers(value: &Value, prefix: &str, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                leaf_pointers(item, &format!("{}/{}", prefix, idx), out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                leaf_pointers(item, &format!("{}/{}", prefix, escape(key)), out);
            }
        }
        _ => out.push(prefix.to_owned()),
    }
}

#[test]
fn add_then_remove_is_identity() {
    let mut rng = StdRng::seed_from_u64(21);
    let params = Params::default();
    for _ in 0..25 {
        let original = json!({ "data": params.gen(&mut rng) });
        let mut doc = original.clone();

        let value = params.gen(&mut rng);
        let p = from_value(json!([{ "op": "add", "path": "/fresh", "value": value }])).unwrap();
        patch(&mut doc, &p).unwrap();

        let p = from_value(json!([{ "op": "remove", "path": "/fresh" }])).unwrap();
        patch(&mut doc, &p).unwrap();

        assert_eq!(doc, original);
    }
}

#[test]
fn remove_then_add_back_every_leaf_is_identity() {
    let mut rng = StdRng::seed_from_u64(42);
    let params = Params::default();
    for _ in 0..25 {
        let original = json!({ "data": params.gen(&mut rng) });

        let mut leafs = Vec::new();
        leaf_pointers(&original, "", &mut leafs);

        for pointer in leafs {
            let leaf = original.pointer(&pointer).unwrap().clone();
            let p = from_value(json!([
                { "op": "remove", "path": pointer },
                { "op": "add", "path": pointer, "value": leaf }
            ]))
            .unwrap();
            let mut doc = original.clone();
            patch(&mut doc, &p).unwrap();
            assert_eq!(doc, original);
        }
    }
}

#[test]
fn move_equals_copy_then_remove() {
    let mut rng = StdRng::seed_from_u64(7);
    let params = Params::default();
    for _ in 0..25 {
        let original = json!({ "data": params.gen(&mut rng) });

        let mut leafs = Vec::new();
        leaf_pointers(&original, "", &mut leafs);
        let from = &leafs[rng.gen_range(0..leafs.len())];

        let mut moved = original.clone();
        let p = from_value(json!([{ "op": "move", "from": from, "path": "/relocated" }])).unwrap();
        patch(&mut moved, &p).unwrap();

        let mut copied = original.clone();
        let p = from_value(json!([
            { "op": "copy", "from": from, "path": "/relocated" },
            { "op": "remove", "path": from }
        ]))
        .unwrap();
        patch(&mut copied, &p).unwrap();

        assert_eq!(moved, copied);
    }
}

#[test]
fn failed_patches_leave_no_trace() {
    let mut rng = StdRng::seed_from_u64(99);
    let params = Params::default();
    for _ in 0..25 {
        let original = json!({ "data": params.gen(&mut rng) });

        let mut leafs = Vec::new();
        leaf_pointers(&original, "", &mut leafs);
        let target = &leafs[rng.gen_range(0..leafs.len())];

        // the second remove addresses a location the first one vacated
        let p = from_value(json!([
            { "op": "remove", "path": target },
            { "op": "remove", "path": "/data/this/does/not/exist" }
        ]))
        .unwrap();
        let mut doc = original.clone();
        patch(&mut doc, &p).unwrap_err();
        assert_eq!(doc, original);
    }
}
