//! ABI bindings for the contracts the engine talks to.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface ITokenFactory {
        struct TokenInfo {
            address tokenAddress;
            address creator;
            string name;
            string symbol;
            uint256 totalSupply;
            uint256 initialLiquidity;
            uint256 lockPeriod;
            uint256 createdAt;
        }

        event TokenCreated(
            address indexed creator,
            address indexed tokenAddress,
            string name,
            string symbol,
            uint256 totalSupply,
            uint256 initialLiquidity,
            uint256 lockPeriod
        );

        function getCreatedTokens(address creator) external view returns (address[] memory);
        function getTokenInfo(address tokenAddress) external view returns (TokenInfo memory);
    }

    #[sol(rpc)]
    interface IBadgeNFT {
        event BadgeMinted(
            address indexed recipient,
            uint256 indexed tokenId,
            uint8 badgeType,
            address tokenAddress,
            uint256 achievementValue
        );

        function hasBadge(address user, uint8 badgeType) external view returns (bool);
        function badgeRequirements(uint8 badgeType) external view returns (uint256);
        function mintBadge(
            address to,
            uint8 badgeType,
            address tokenAddress,
            uint256 achievementValue
        ) external returns (uint256);
    }

    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
    }
}
