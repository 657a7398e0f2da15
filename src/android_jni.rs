use crate::config::HalConfig;
use crate::error::{throw_java_exception, HResult, HalError};
use crate::hub::SensorHub;
use crate::clock::SystemClock;
use crate::sample::{SensorBaseData, SENSOR_DATA_MAX};
use crate::sensor_type::SensorType;
use jni::objects::{JClass, JFloatArray, JString};
use jni::sys::{jboolean, jint, jlong, jstring, JNI_FALSE};
use jni::JNIEnv;
use std::sync::Mutex;

// Global hub - stored as static to persist across JNI calls
lazy_static::lazy_static! {
    static ref GLOBAL_HUB: Mutex<Option<SensorHub>> = Mutex::new(None);
}

/// Run `f` against the global hub, building it from defaults on first use
fn with_hub<T>(f: impl FnOnce(&mut SensorHub) -> HResult<T>) -> HResult<T> {
    let mut hub_guard = GLOBAL_HUB.lock().map_err(|_| {
        HalError::Internal("Failed to acquire global hub lock".to_string())
    })?;

    if hub_guard.is_none() {
        *hub_guard = Some(SensorHub::from_config(
            &HalConfig::default(),
            SystemClock::shared(),
        )?);
    }

    match hub_guard.as_mut() {
        Some(hub) => f(hub),
        None => Err(HalError::Internal("Sensor hub unavailable".to_string())),
    }
}

fn new_java_string(env: &mut JNIEnv, value: &str) -> jstring {
    match env.new_string(value) {
        Ok(jstr) => jstr.into_raw(),
        Err(_) => {
            let _ = throw_java_exception(
                env,
                &HalError::JniError("Failed to create Java string".to_string()),
            );
            std::ptr::null_mut()
        }
    }
}

/// JNI: (Re)build the hub from a JSON configuration, null for defaults
/// Returns: 0 on success, -1 on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_swsensor_SensorHalBinding_init(
    mut env: JNIEnv,
    _class: JClass,
    config_json: JString,
) -> jint {
    let config = if config_json.is_null() {
        Ok(None)
    } else {
        env.get_string(&config_json)
            .map(|s| Some(String::from(s)))
            .map_err(|e| HalError::JniError(e.to_string()))
    };

    match config.and_then(|json| init_impl(json.as_deref())) {
        Ok(_) => 0,
        Err(e) => {
            let _ = throw_java_exception(&mut env, &e);
            -1
        }
    }
}

fn init_impl(config_json: Option<&str>) -> HResult<()> {
    crate::init_logging();

    let config = match config_json {
        Some(json) => HalConfig::from_json_str(json)?,
        None => HalConfig::default(),
    };
    let hub = SensorHub::from_config(&config, SystemClock::shared())?;

    let mut hub_guard = GLOBAL_HUB.lock().map_err(|_| {
        HalError::Internal("Failed to acquire global hub lock".to_string())
    })?;
    *hub_guard = Some(hub);

    log::info!("Sensor HAL initialised ({} sensors)", config.sensors.len());
    Ok(())
}

/// JNI: Hand a processed accel+gyro fusion sample to the software sensors
/// Parameters: processed values (up to 16), timestamp (ns), producer period (ns)
/// Returns: number of transform cycles run, -1 on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_swsensor_SensorHalBinding_pushFusionSample(
    mut env: JNIEnv,
    _class: JClass,
    processed: JFloatArray,
    timestamp: jlong,
    pollrate_ns: jlong,
) -> jint {
    let mut buf = [0.0f32; SENSOR_DATA_MAX];
    let values = env
        .get_array_length(&processed)
        .map_err(|e| HalError::JniError(e.to_string()))
        .and_then(|len| {
            let len = usize::try_from(len)
                .map_err(|_| HalError::InvalidParameters("negative array length".to_string()))?;
            if len > SENSOR_DATA_MAX {
                return Err(HalError::InvalidParameters(format!(
                    "processed buffer holds {} values, at most {} allowed",
                    len, SENSOR_DATA_MAX
                )));
            }
            env.get_float_array_region(&processed, 0, &mut buf[..len])
                .map_err(|e| HalError::JniError(e.to_string()))?;
            Ok(len)
        });

    match values.and_then(|len| push_fusion_sample_impl(&buf[..len], timestamp, pollrate_ns)) {
        Ok(cycles) => cycles as jint,
        Err(e) => {
            let _ = throw_java_exception(&mut env, &e);
            -1
        }
    }
}

fn push_fusion_sample_impl(processed: &[f32], timestamp: i64, pollrate_ns: i64) -> HResult<usize> {
    let sample = SensorBaseData::from_processed(processed, timestamp, pollrate_ns)?;
    with_hub(|hub| Ok(hub.deliver(SensorType::AccelGyroFusion6X, &sample)))
}

/// JNI: Enable or disable a software sensor
/// Returns: 0 on success, -1 on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_swsensor_SensorHalBinding_setEnable(
    mut env: JNIEnv,
    _class: JClass,
    handle: jint,
    enable: jboolean,
) -> jint {
    match with_hub(|hub| hub.set_enable(handle, enable != JNI_FALSE)) {
        Ok(_) => 0,
        Err(e) => {
            let _ = throw_java_exception(&mut env, &e);
            -1
        }
    }
}

/// JNI: Request a sampling period
/// Returns: effective period in ns, -1 on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_swsensor_SensorHalBinding_setDelay(
    mut env: JNIEnv,
    _class: JClass,
    handle: jint,
    period_ns: jlong,
) -> jlong {
    match with_hub(|hub| hub.set_delay(handle, period_ns)) {
        Ok(effective) => effective,
        Err(e) => {
            let _ = throw_java_exception(&mut env, &e);
            -1
        }
    }
}

/// JNI: Queue a flush-complete event behind pending events
/// Returns: 0 on success, -1 on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_swsensor_SensorHalBinding_flush(
    mut env: JNIEnv,
    _class: JClass,
    handle: jint,
) -> jint {
    match with_hub(|hub| hub.flush(handle)) {
        Ok(_) => 0,
        Err(e) => {
            let _ = throw_java_exception(&mut env, &e);
            -1
        }
    }
}

/// JNI: Drain up to `max` events as a JSON array
/// Returns: JSON string or null on error (throws Java exception)
#[no_mangle]
pub extern "C" fn Java_com_example_swsensor_SensorHalBinding_pollEvents(
    mut env: JNIEnv,
    _class: JClass,
    max: jint,
) -> jstring {
    match poll_events_impl(max) {
        Ok(json) => new_java_string(&mut env, &json),
        Err(e) => {
            let _ = throw_java_exception(&mut env, &e);
            std::ptr::null_mut()
        }
    }
}

fn poll_events_impl(max: i32) -> HResult<String> {
    let max = usize::try_from(max)
        .map_err(|_| HalError::InvalidParameters(format!("max must be >= 0, got {}", max)))?;
    let events = with_hub(|hub| Ok(hub.poll_events(max)))?;
    serde_json::to_string(&events)
        .map_err(|_| HalError::Internal("JSON serialization failed".to_string()))
}

/// JNI: Sensor list as a JSON array of descriptors
#[no_mangle]
pub extern "C" fn Java_com_example_swsensor_SensorHalBinding_getSensorList(
    mut env: JNIEnv,
    _class: JClass,
) -> jstring {
    match get_sensor_list_impl() {
        Ok(json) => new_java_string(&mut env, &json),
        Err(e) => {
            let _ = throw_java_exception(&mut env, &e);
            std::ptr::null_mut()
        }
    }
}

fn get_sensor_list_impl() -> HResult<String> {
    let descriptors = with_hub(|hub| Ok(hub.descriptors()))?;
    serde_json::to_string(&descriptors)
        .map_err(|_| HalError::Internal("JSON serialization failed".to_string()))
}

/// JNI: Monotonic time used to stamp sensor events, ns
#[no_mangle]
pub extern "C" fn Java_com_example_swsensor_SensorHalBinding_getTime(
    _env: JNIEnv,
    _class: JClass,
) -> jlong {
    SystemClock::instance().get_time()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SensorEvent;
    use crate::descriptor::SensorDescriptor;

    // Only test touching the global hub, keeps it free of cross-test races
    #[test]
    fn test_global_hub_flow() {
        init_impl(Some(
            r#"{ "sensors": [{ "name": "game-rv", "handle": 42, "kind": "game_rotation_vector" }] }"#,
        ))
        .unwrap();

        let sensors: Vec<SensorDescriptor> =
            serde_json::from_str(&get_sensor_list_impl().unwrap()).unwrap();
        assert_eq!(sensors.len(), 2);
        assert_eq!(sensors[1].handle, 42);

        with_hub(|hub| hub.set_enable(42, true)).unwrap();

        // Stamped after enable on the same clock the hub uses
        let now = SystemClock::instance().get_time();
        let cycles =
            push_fusion_sample_impl(&[0.1, 0.2, 0.3, 0.4, 0.5], now + 1, 20_000_000).unwrap();
        assert_eq!(cycles, 1);

        let events: Vec<SensorEvent> = serde_json::from_str(&poll_events_impl(16).unwrap()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].values(), &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(events[0].timestamp, now + 1);

        assert!(push_fusion_sample_impl(&[0.0; SENSOR_DATA_MAX + 1], now + 2, 1).is_err());
        assert!(poll_events_impl(-1).is_err());
        assert_eq!(with_hub(|hub| hub.flush(7)), Err(HalError::UnknownHandle(7)));
    }
}
