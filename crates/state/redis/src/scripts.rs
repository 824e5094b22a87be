/// Lua script raising an entry's expiry (monotonic max).
///
/// KEYS\[1\] = the entry hash
/// ARGV\[1\] = new expiry (Unix milliseconds)
///
/// Creates the entry with an empty value when missing. Returns 1 if the
/// entry was written, 0 if the stored expiry was already at least as high.
pub const RAISE_EXPIRY: &str = r"
local new = tonumber(ARGV[1])
local cur = redis.call('HGET', KEYS[1], 'exp')
if not cur then
    redis.call('HSET', KEYS[1], 'v', '', 'exp', ARGV[1])
    return 1
end
if tonumber(cur) < new then
    redis.call('HSET', KEYS[1], 'exp', ARGV[1])
    return 1
end
return 0
";

/// Lua script deleting an entry only if it matches the expected contents.
///
/// KEYS\[1\] = the entry hash
/// ARGV\[1\] = expected value
/// ARGV\[2\] = expected expiry (Unix milliseconds)
///
/// Returns 1 if the entry was deleted, 0 otherwise.
pub const COMPARE_AND_DELETE: &str = r"
local cur = redis.call('HMGET', KEYS[1], 'v', 'exp')
if not cur[1] or not cur[2] then
    return 0
end
if cur[1] == ARGV[1] and tonumber(cur[2]) == tonumber(ARGV[2]) then
    redis.call('DEL', KEYS[1])
    return 1
end
return 0
";

/// Lua script deleting an entry if its expiry is at or before `now`.
///
/// KEYS\[1\] = the entry hash
/// ARGV\[1\] = now (Unix milliseconds)
///
/// Returns 1 if the entry was deleted, 0 otherwise.
pub const PURGE_IF_EXPIRED: &str = r"
local exp = redis.call('HGET', KEYS[1], 'exp')
if not exp then
    return 0
end
if tonumber(exp) <= tonumber(ARGV[1]) then
    redis.call('DEL', KEYS[1])
    return 1
end
return 0
";
