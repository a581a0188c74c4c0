//! JNI bindings for the Android host. Every entry point takes and returns
//! JSON strings wrapped in an `{"ok": ..}` envelope; nothing here panics on
//! bad input.

use engine::config::DEFAULT_MAX_BUILDS;
use engine::export::{parse_import, text_summary};
use engine::{BuildTotals, rank};
use jni::objects::{JClass, JString};
use jni::sys::{jdouble, jstring};
use jni::JNIEnv;
use serde::Serialize;
use serde_json::json;

fn ok(value: impl Serialize) -> String {
    match serde_json::to_value(value) {
        Ok(result) => json!({ "ok": true, "result": result }).to_string(),
        Err(e) => err(e),
    }
}

fn err(e: impl std::fmt::Display) -> String {
    json!({ "ok": false, "error": e.to_string() }).to_string()
}

fn to_jstring(env: &JNIEnv, text: String) -> jstring {
    match env.new_string(text) {
        Ok(s) => s.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Run `f` on the Java string argument and hand its envelope back to Java.
fn with_input(mut env: JNIEnv, input: JString, f: fn(&str) -> String) -> jstring {
    let text: String = match env.get_string(&input) {
        Ok(s) => s.into(),
        Err(e) => return to_jstring(&env, err(format!("invalid_input: {}", e))),
    };
    to_jstring(&env, f(&text))
}

pub fn version_internal() -> String {
    format!("dmgcalc-ffi {}", env!("CARGO_PKG_VERSION"))
}

pub fn evaluate_average_internal(expr: &str) -> f64 {
    engine::evaluate_average(expr)
}

pub fn compute_builds_internal(json: &str) -> String {
    match parse_import(json, DEFAULT_MAX_BUILDS) {
        Ok(builds) => ok(builds.iter().map(|b| b.totals()).collect::<Vec<BuildTotals>>()),
        Err(e) => err(e),
    }
}

pub fn rank_internal(json: &str) -> String {
    match parse_import(json, DEFAULT_MAX_BUILDS) {
        Ok(builds) => ok(rank(&builds)),
        Err(e) => err(e),
    }
}

pub fn export_text_internal(json: &str) -> String {
    match parse_import(json, DEFAULT_MAX_BUILDS) {
        Ok(builds) => ok(text_summary(&builds)),
        Err(e) => err(e),
    }
}

#[no_mangle]
pub extern "system" fn Java_com_dmgcalc_Ffi_version<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    to_jstring(&env, version_internal())
}

#[no_mangle]
pub extern "system" fn Java_com_dmgcalc_Ffi_evaluateAverage<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    expr: JString<'local>,
) -> jdouble {
    match env.get_string(&expr) {
        Ok(s) => evaluate_average_internal(&String::from(s)),
        Err(_) => 0.0,
    }
}

#[no_mangle]
pub extern "system" fn Java_com_dmgcalc_Ffi_computeBuildsJson(
    env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    with_input(env, json, compute_builds_internal)
}

#[no_mangle]
pub extern "system" fn Java_com_dmgcalc_Ffi_rankJson(
    env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    with_input(env, json, rank_internal)
}

#[no_mangle]
pub extern "system" fn Java_com_dmgcalc_Ffi_exportTextJson(
    env: JNIEnv,
    _class: JClass,
    json: JString,
) -> jstring {
    with_input(env, json, export_text_internal)
}
