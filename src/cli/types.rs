use super::args::WaitFor;
use crate::readiness::GateKind;

impl From<WaitFor> for Option<GateKind> {
    fn from(w: WaitFor) -> Self {
        match w {
            WaitFor::NoWait => None,
            WaitFor::Started => Some(GateKind::Started),
            WaitFor::Synced => Some(GateKind::Synced),
        }
    }
}
