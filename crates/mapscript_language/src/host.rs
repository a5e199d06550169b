//! Host calls: instructions the interpreter forwards to its embedder.
//!
//! The interpreter pops a host call's arguments (first pushed, first in the
//! slice), hands them to [`crate::VmContext::host_call`], and pushes the
//! result when the call produces one.

/// A host call instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum HostOp {
    /// `[] -> [ticks]`
    GameTime = 0x80A0,
    /// `[] -> [obj]`, the script's owner.
    SelfObj = 0x80A1,
    /// `[] -> [obj]`, the object that triggered the procedure.
    SourceObj = 0x80A2,
    /// `[] -> [obj]`, the object the procedure acts on.
    TargetObj = 0x80A3,
    /// `[] -> [param]`
    FixedParam = 0x80A4,
    /// `[] -> [kind]`, the procedure kind being run.
    ScriptAction = 0x80A5,
    /// `[] -> [sid]`
    SelfSid = 0x80A6,
    /// `[index] -> [value]`
    LocalVar = 0x80A7,
    /// `[index, value] -> []`
    SetLocalVar = 0x80A8,
    /// `[delay, param] -> []`, schedule this script's timed procedure.
    AddTimerEvent = 0x80A9,
    /// `[] -> []`, tell the caller the default behavior was overridden.
    ScriptOverrides = 0x80AA,
    /// `[sid, kind] -> [ok]`, run another script's procedure.
    RunProc = 0x80AB,

    /// `[attacker, defender] -> []`
    RequestCombat = 0x80B0,
    /// `[] -> []`
    RequestTownMap = 0x80B1,
    /// `[] -> []`
    RequestWorldMap = 0x80B2,
    /// `[elevator] -> []`
    RequestElevator = 0x80B3,
    /// `[tile, elevation, min, max] -> []`
    RequestExplosion = 0x80B4,
    /// `[obj] -> []`
    RequestDialog = 0x80B5,
    /// `[] -> []`
    RequestEndgame = 0x80B6,
    /// `[looter, container] -> []`
    RequestLooting = 0x80B7,
    /// `[thief, target] -> []`
    RequestStealing = 0x80B8,

    /// `[len] -> [id]`, allocate a scratch array freed at the end of the tick.
    TempArray = 0x80C0,
    /// `[id, index, value] -> []`
    SetArray = 0x80C1,
    /// `[id, index] -> [value]`
    GetArray = 0x80C2,

    /// `[msg] -> []`
    DebugMsg = 0x80C8,
}

impl HostOp {
    /// Every host call.
    pub const ALL: [HostOp; 25] = [
        HostOp::GameTime,
        HostOp::SelfObj,
        HostOp::SourceObj,
        HostOp::TargetObj,
        HostOp::FixedParam,
        HostOp::ScriptAction,
        HostOp::SelfSid,
        HostOp::LocalVar,
        HostOp::SetLocalVar,
        HostOp::AddTimerEvent,
        HostOp::ScriptOverrides,
        HostOp::RunProc,
        HostOp::RequestCombat,
        HostOp::RequestTownMap,
        HostOp::RequestWorldMap,
        HostOp::RequestElevator,
        HostOp::RequestExplosion,
        HostOp::RequestDialog,
        HostOp::RequestEndgame,
        HostOp::RequestLooting,
        HostOp::RequestStealing,
        HostOp::TempArray,
        HostOp::SetArray,
        HostOp::GetArray,
        HostOp::DebugMsg,
    ];

    /// Returns the instruction word.
    #[must_use]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Decodes a host call.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.code() == code)
    }

    /// Number of arguments popped.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::GameTime
            | Self::SelfObj
            | Self::SourceObj
            | Self::TargetObj
            | Self::FixedParam
            | Self::ScriptAction
            | Self::SelfSid
            | Self::ScriptOverrides
            | Self::RequestTownMap
            | Self::RequestWorldMap
            | Self::RequestEndgame => 0,
            Self::LocalVar
            | Self::RequestElevator
            | Self::RequestDialog
            | Self::TempArray
            | Self::DebugMsg => 1,
            Self::SetLocalVar
            | Self::AddTimerEvent
            | Self::RunProc
            | Self::RequestCombat
            | Self::RequestLooting
            | Self::RequestStealing
            | Self::GetArray => 2,
            Self::SetArray => 3,
            Self::RequestExplosion => 4,
        }
    }

    /// Whether the call pushes a result.
    #[must_use]
    pub const fn returns_value(self) -> bool {
        matches!(
            self,
            Self::GameTime
                | Self::SelfObj
                | Self::SourceObj
                | Self::TargetObj
                | Self::FixedParam
                | Self::ScriptAction
                | Self::SelfSid
                | Self::LocalVar
                | Self::RunProc
                | Self::TempArray
                | Self::GetArray
        )
    }

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::GameTime => "game_time",
            Self::SelfObj => "self_obj",
            Self::SourceObj => "source_obj",
            Self::TargetObj => "target_obj",
            Self::FixedParam => "fixed_param",
            Self::ScriptAction => "script_action",
            Self::SelfSid => "self_sid",
            Self::LocalVar => "local_var",
            Self::SetLocalVar => "set_local_var",
            Self::AddTimerEvent => "add_timer_event",
            Self::ScriptOverrides => "script_overrides",
            Self::RunProc => "run_proc",
            Self::RequestCombat => "request_combat",
            Self::RequestTownMap => "request_town_map",
            Self::RequestWorldMap => "request_world_map",
            Self::RequestElevator => "request_elevator",
            Self::RequestExplosion => "request_explosion",
            Self::RequestDialog => "request_dialog",
            Self::RequestEndgame => "request_endgame",
            Self::RequestLooting => "request_looting",
            Self::RequestStealing => "request_stealing",
            Self::TempArray => "temp_array",
            Self::SetArray => "set_array",
            Self::GetArray => "get_array",
            Self::DebugMsg => "debug_msg",
        }
    }
}
