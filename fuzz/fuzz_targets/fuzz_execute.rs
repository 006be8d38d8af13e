#![no_main]

use libfuzzer_sys::fuzz_target;
use hexabus_sm::{EndpointError, ErrorCode, Host, Machine, SourceContext, Trigger, Value};

struct FuzzHost;

impl Host for FuzzHost {
    fn write_endpoint(&mut self, _eid: u32, _value: &Value<'_>) -> Result<(), EndpointError> {
        Ok(())
    }

    fn system_time(&mut self) -> u64 {
        1_700_000_000
    }

    fn log_diagnostic(&mut self, _code: ErrorCode, _location: &str) {}
}

fuzz_target!(|data: &[u8]| {
    // Arbitrary programs must never panic or escape the engine's bounds;
    // they either complete or halt with a protocol error code.
    let mut host = FuzzHost;

    let mut machine = Machine::new();
    let _ = machine.run(data, Trigger::Periodic, &mut host);
    // second invocation exercises the non-init dispatch path
    let _ = machine.run(data, Trigger::Periodic, &mut host);

    let source = [0x20, 0x01, 0x0D, 0xB8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1];
    let trigger = Trigger::Value(SourceContext {
        ip: &source,
        eid: 23,
        value: Value::U32(0xDEAD),
    });
    let _ = machine.run(data, trigger, &mut host);
});
